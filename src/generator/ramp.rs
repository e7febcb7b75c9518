use super::{GeneratorState, SignalGenerator};

/// Direction of a linear ramp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampDirection {
    /// 0.0 towards 1.0
    Up,
    /// 1.0 towards 0.0
    Down,
}

/// A linear ramp generator used for fades
///
/// Sample `i` of an `Up` ramp over `n` samples is `i / n`, so the ramp starts
/// at exactly 0.0 and stops one step short of 1.0. A `Down` ramp mirrors it:
/// `1 - i / n`. After `n` samples the generator holds its end value.
pub struct RampGenerator {
    /// Current sample position
    position: usize,
    /// Total duration in samples
    duration: usize,
    direction: RampDirection,
    /// Whether the generator has completed
    completed: bool,
}

impl RampGenerator {
    /// Create a new ramp generator
    ///
    /// # Example
    /// ```
    /// use beeps::generator::{RampDirection, RampGenerator};
    ///
    /// let fade_in = RampGenerator::new(800, RampDirection::Up);
    /// ```
    pub fn new(duration_samples: usize, direction: RampDirection) -> Self {
        Self {
            position: 0,
            duration: duration_samples.max(1), // Ensure at least 1 sample
            direction,
            completed: false,
        }
    }

    /// Get the current position in samples
    pub fn position(&self) -> usize {
        self.position
    }

    /// Get the total duration in samples
    pub fn duration(&self) -> usize {
        self.duration
    }

    fn value_at(&self, position: usize) -> f64 {
        let t = position as f64 / self.duration as f64;
        match self.direction {
            RampDirection::Up => t,
            RampDirection::Down => 1.0 - t,
        }
    }

    fn end_value(&self) -> f64 {
        match self.direction {
            RampDirection::Up => 1.0,
            RampDirection::Down => 0.0,
        }
    }
}

impl SignalGenerator for RampGenerator {
    fn process(&mut self, buffer: &mut [f64]) -> GeneratorState {
        if self.completed {
            buffer.fill(self.end_value());
            return GeneratorState::Complete;
        }

        let remaining = self.duration.saturating_sub(self.position);

        for (i, sample) in buffer.iter_mut().enumerate() {
            *sample = if i < remaining {
                self.value_at(self.position + i)
            } else {
                self.end_value()
            };
        }

        self.position += buffer.len();

        if self.position >= self.duration {
            self.completed = true;
            GeneratorState::Complete
        } else {
            GeneratorState::Running
        }
    }

    fn is_complete(&self) -> bool {
        self.completed
    }

    fn reset(&mut self) {
        self.position = 0;
        self.completed = false;
    }
}

/// Fade-in and fade-out curves applied to the edges of a tone
///
/// Both curves are `fade_len` samples long and are computed once.
#[derive(Debug, Clone)]
pub struct Envelope {
    fade_in: Vec<f64>,
    fade_out: Vec<f64>,
}

impl Envelope {
    pub fn new(fade_len: usize) -> Self {
        let mut fade_in = vec![0.0; fade_len];
        let mut fade_out = vec![0.0; fade_len];
        RampGenerator::new(fade_len, RampDirection::Up).process(&mut fade_in);
        RampGenerator::new(fade_len, RampDirection::Down).process(&mut fade_out);
        Self { fade_in, fade_out }
    }

    pub fn fade_len(&self) -> usize {
        self.fade_in.len()
    }

    pub fn fade_in(&self) -> &[f64] {
        &self.fade_in
    }

    pub fn fade_out(&self) -> &[f64] {
        &self.fade_out
    }

    /// Taper both edges of `buffer`
    ///
    /// Buffers no longer than the fade are left untouched. Returns whether
    /// the fades were applied.
    pub fn apply(&self, buffer: &mut [f64]) -> bool {
        let fade_len = self.fade_len();
        if buffer.len() <= fade_len {
            return false;
        }

        for (sample, gain) in buffer.iter_mut().zip(&self.fade_in) {
            *sample *= gain;
        }
        let tail = buffer.len() - fade_len;
        for (sample, gain) in buffer[tail..].iter_mut().zip(&self.fade_out) {
            *sample *= gain;
        }
        true
    }
}
