//! Square-wave note player and two-voice chiptune track builder

pub mod error;
pub mod generator;
pub mod pipeline;
pub mod pitch;
pub mod tune;
pub mod wav;

pub use error::{BeepError, Result};
pub use generator::{SynthConfig, ToneSynth};
pub use pipeline::{PlaybackSequencer, SequencerConfig};
pub use pitch::{resolve, Note, NoteToken};
pub use tune::{Tempo, TrackAssembler, Tune};
