//! Playback pipeline
//!
//! - Script: parse `note:duration` scripts
//! - Device: audio output boundary and its cpal implementation
//! - Sequencer: strictly sequential note playback

pub mod device;
pub mod script;
pub mod sequencer;

pub use device::{AudioDevice, CpalDevice, PlaybackHandle, SilentDevice};
pub use script::{load_script, parse_script, ScriptStep};
pub use sequencer::{PlaybackSequencer, SequencerConfig, SequencerState};
