use super::{GeneratorState, SignalGenerator};
use std::f64::consts::PI;

/// Ideal square wave generator
///
/// Produces `sign(sin(2π·f·t))` for a fixed number of samples evenly spaced
/// over `[0, duration)`. Values are exactly -1.0, 0.0 or +1.0 (the zero shows
/// up where the sine crosses zero exactly, e.g. at t = 0).
pub struct SquareGenerator {
    frequency: f64,
    /// Seconds between two consecutive samples
    step: f64,
    position: usize,
    total: usize,
    completed: bool,
}

impl SquareGenerator {
    /// # Arguments
    /// * `frequency` - Fundamental frequency in Hz
    /// * `duration` - Length of the tone in seconds
    /// * `total_samples` - Number of samples spread over the duration
    pub fn new(frequency: f64, duration: f64, total_samples: usize) -> Self {
        let step = if total_samples > 0 {
            duration / total_samples as f64
        } else {
            0.0
        };
        Self {
            frequency,
            step,
            position: 0,
            total: total_samples,
            completed: total_samples == 0,
        }
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn total_samples(&self) -> usize {
        self.total
    }

    fn value_at(&self, position: usize) -> f64 {
        let t = position as f64 * self.step;
        sign((2.0 * PI * self.frequency * t).sin())
    }
}

/// Three-way sign: unlike `f64::signum`, zero maps to zero
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

impl SignalGenerator for SquareGenerator {
    fn process(&mut self, buffer: &mut [f64]) -> GeneratorState {
        if self.completed {
            buffer.fill(0.0);
            return GeneratorState::Complete;
        }

        let remaining = self.total.saturating_sub(self.position);
        for (i, sample) in buffer.iter_mut().enumerate() {
            *sample = if i < remaining {
                self.value_at(self.position + i)
            } else {
                0.0
            };
        }

        self.position += buffer.len();

        if self.position >= self.total {
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
        self.completed = self.total == 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_values() {
        // 1 Hz over 1 second with 8 samples: first half positive, second negative
        let mut square = SquareGenerator::new(1.0, 1.0, 8);
        let mut buffer = [9.0f64; 8];

        let state = square.process(&mut buffer);
        assert_eq!(state, GeneratorState::Complete);
        assert_eq!(buffer[0], 0.0);
        assert_eq!(&buffer[1..4], &[1.0, 1.0, 1.0]);
        assert_eq!(&buffer[5..8], &[-1.0, -1.0, -1.0]);
    }

    #[test]
    fn test_square_frames_match_single_pass() {
        let mut whole = SquareGenerator::new(440.0, 0.1, 4410);
        let mut expected = vec![0.0f64; 4410];
        whole.process(&mut expected);

        let mut framed = SquareGenerator::new(440.0, 0.1, 4410);
        let mut actual = Vec::new();
        let mut frame = [0.0f64; 64];
        loop {
            let state = framed.process(&mut frame);
            actual.extend_from_slice(&frame);
            if state == GeneratorState::Complete {
                break;
            }
        }

        assert_eq!(&actual[..4410], &expected[..]);
        // Past the end the generator pads with silence
        assert!(actual[4410..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_square_only_unit_values() {
        let mut square = SquareGenerator::new(261.63, 0.05, 2205);
        let mut buffer = vec![0.0f64; 2205];
        square.process(&mut buffer);
        assert!(buffer.iter().all(|&s| s == 1.0 || s == -1.0 || s == 0.0));
        assert!(buffer.iter().any(|&s| s == 1.0));
        assert!(buffer.iter().any(|&s| s == -1.0));
    }

    #[test]
    fn test_empty_square_is_complete() {
        let mut square = SquareGenerator::new(440.0, 0.0, 0);
        assert!(square.is_complete());
        let mut buffer = [1.0f64; 4];
        assert_eq!(square.process(&mut buffer), GeneratorState::Complete);
        assert_eq!(buffer, [0.0; 4]);
    }

    #[test]
    fn test_square_reset() {
        let mut square = SquareGenerator::new(440.0, 0.01, 441);
        let mut first = vec![0.0f64; 441];
        square.process(&mut first);
        assert!(square.is_complete());

        square.reset();
        assert!(!square.is_complete());
        let mut second = vec![0.0f64; 441];
        square.process(&mut second);
        assert_eq!(first, second);
    }
}
