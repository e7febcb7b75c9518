pub mod ramp;
pub mod square;
pub mod tone;

pub use ramp::{Envelope, RampDirection, RampGenerator};
pub use square::SquareGenerator;
pub use tone::{quantize, sample_count, SynthConfig, ToneSynth};

/// Represents the current state of a signal generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    /// Generator is still producing samples
    Running,
    /// Generator has completed and will produce no more samples
    Complete,
}

/// Core trait for all signal generators
///
/// Signal generators produce samples frame by frame into caller-owned
/// buffers. A whole note can be rendered in one call by passing a buffer
/// sized to the note.
pub trait SignalGenerator {
    /// Process the next frame of samples
    ///
    /// # Arguments
    /// * `buffer` - Mutable slice to write samples into. The length determines frame size.
    ///
    /// # Returns
    /// * `GeneratorState::Running` if the generator is still active
    /// * `GeneratorState::Complete` if the generator has finished
    ///
    /// # Note
    /// Even when Complete is returned, the buffer is still filled with valid
    /// samples (the generator's resting value) for the current frame.
    fn process(&mut self, buffer: &mut [f64]) -> GeneratorState;

    /// Check if this generator has completed
    fn is_complete(&self) -> bool;

    /// Reset the generator to its initial state
    fn reset(&mut self);
}
