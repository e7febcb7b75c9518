//! Sequential note playback
//!
//! The sequencer renders notes and hands them to an [`AudioDevice`] one at a
//! time. A new sound is never submitted while the previous one is still
//! playing: the sequencer blocks on the previous handle first. Nothing is
//! ever cut short; there is no cancellation and no timeout.
//!
//! Call [`PlaybackSequencer::finish`] when done so the last note can ring
//! out. Dropping the sequencer releases the device immediately.

use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use super::device::{AudioDevice, PlaybackHandle};
use crate::error::{BeepError, Result};
use crate::generator::{quantize, SynthConfig, ToneSynth};
use crate::pitch::{Note, NoteToken};
use crate::tune::Step;

/// Sequencer settings
#[derive(Debug, Clone, Default)]
pub struct SequencerConfig {
    pub synth: SynthConfig,
    /// Suppress the per-note log lines
    pub mute_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Idle,
    Playing,
}

/// Plays notes strictly one after the other on an audio device
pub struct PlaybackSequencer<D: AudioDevice> {
    device: D,
    synth: ToneSynth,
    mute_output: bool,
    /// The only in-flight sound, if any
    current: Option<D::Handle>,
    /// When the most recent sound or pause is due to end
    deadline: Option<Instant>,
    finished: bool,
}

fn to_duration(seconds: f64) -> Result<Duration> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(BeepError::InvalidDuration(seconds));
    }
    Ok(Duration::from_secs_f64(seconds))
}

impl<D: AudioDevice> PlaybackSequencer<D> {
    /// Create a sequencer on `device`
    ///
    /// Fails with `InvalidConfiguration` when the volume is outside [0, 1].
    pub fn new(device: D, config: SequencerConfig) -> Result<Self> {
        Ok(Self {
            device,
            synth: ToneSynth::new(config.synth)?,
            mute_output: config.mute_output,
            current: None,
            deadline: None,
            finished: false,
        })
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn synth(&self) -> &ToneSynth {
        &self.synth
    }

    pub fn state(&self) -> SequencerState {
        match &self.current {
            Some(handle) if handle.is_playing() => SequencerState::Playing,
            _ => SequencerState::Idle,
        }
    }

    /// Time left until the most recent sound or pause ends
    pub fn remaining(&self) -> Duration {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .unwrap_or_default()
    }

    /// Parse and play a note token (or `pause`) for `duration` seconds
    pub fn play_note(&mut self, note: &str, duration: f64) -> Result<()> {
        let note: Note = note.parse()?;
        self.play(&note, duration)
    }

    pub fn play(&mut self, note: &Note, duration: f64) -> Result<()> {
        match note {
            Note::Pause => self.play_pause(duration),
            Note::Pitched(token) => self.play_tone(token, duration),
        }
    }

    /// Stay silent for `duration` seconds once the previous sound is over
    pub fn play_pause(&mut self, duration: f64) -> Result<()> {
        let length = to_duration(duration)?;
        self.wait_for_previous()?;

        if !self.mute_output {
            info!("Pausing for {}s", duration);
        }
        self.deadline = Some(Instant::now() + length);
        thread::sleep(length);
        Ok(())
    }

    fn play_tone(&mut self, token: &NoteToken, duration: f64) -> Result<()> {
        let length = to_duration(duration)?;
        let frequency = token.frequency();
        let samples = quantize(&self.synth.render(frequency, duration));

        self.wait_for_previous()?;
        self.submit(&samples, 1, length)?;

        if !self.mute_output {
            info!("Playing {} ({:.2} Hz) for {}s", token, frequency, duration);
        }
        Ok(())
    }

    /// Play one step of a tune, `beats` long
    ///
    /// Rests stay silent for their beats. A step without beats never sounds,
    /// so its ids are not looked up; it rests for a single beat instead.
    pub fn play_step(&mut self, step: &Step, seconds_per_beat: f64) -> Result<()> {
        let duration = step.beats as f64 * seconds_per_beat;
        if duration > 0.0 {
            let note = step.note()?;
            self.play(&note, duration)
        } else {
            debug!("Resting for one beat");
            let length = to_duration(seconds_per_beat)?;
            self.wait_for_previous()?;
            self.deadline = Some(Instant::now() + length);
            thread::sleep(length);
            Ok(())
        }
    }

    /// Play an interleaved stereo track and block until it has been played
    pub fn play_track(&mut self, track: &[i16]) -> Result<()> {
        let sample_rate = self.synth.sample_rate();
        let length = super::device::buffer_duration(track.len(), 2, sample_rate);

        self.wait_for_previous()?;
        self.submit(track, 2, length)?;
        if !self.mute_output {
            info!("Playing track of {:.2}s", length.as_secs_f64());
        }
        self.wait_for_previous()
    }

    fn submit(&mut self, samples: &[i16], channels: u16, length: Duration) -> Result<()> {
        let handle = self
            .device
            .submit(samples, channels, self.synth.sample_rate())?;
        self.deadline = Some(Instant::now() + length);
        self.current = Some(handle);
        Ok(())
    }

    /// Block until the in-flight sound, if any, has finished
    ///
    /// A device failure during that sound comes back as `Device`.
    pub fn wait_for_previous(&mut self) -> Result<()> {
        match self.current.take() {
            Some(handle) => handle.wait_until_done(),
            None => Ok(()),
        }
    }

    /// Let the last sound or pause run out, then release the device
    ///
    /// Blocks for the time that remains of the most recent sound, never for
    /// longer than its full duration, then for whatever the device still
    /// has queued. Returns the time that remained of the sound.
    pub fn finish(mut self) -> Duration {
        let remaining = self.remaining();
        if !remaining.is_zero() {
            debug!("Draining last sound for {:.3}s", remaining.as_secs_f64());
            thread::sleep(remaining);
        }
        // The device may still hold the last period of the final sound
        if let Some(handle) = self.current.take() {
            if handle.is_playing() {
                if let Err(err) = handle.wait_until_done() {
                    warn!("Last sound did not finish: {}", err);
                }
            }
        }
        self.finished = true;
        remaining
    }
}

impl<D: AudioDevice> Drop for PlaybackSequencer<D> {
    fn drop(&mut self) {
        if !self.finished && !self.remaining().is_zero() {
            warn!("Sequencer dropped while a sound was still playing; it may be cut short");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::device::SilentDevice;
    use crate::tune::REST;

    fn sequencer() -> PlaybackSequencer<SilentDevice> {
        PlaybackSequencer::new(
            SilentDevice::new(),
            SequencerConfig {
                mute_output: true,
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_invalid_volume() {
        for volume in [-0.5, 1.5] {
            let result = PlaybackSequencer::new(
                SilentDevice::new(),
                SequencerConfig {
                    synth: SynthConfig {
                        volume,
                        ..Default::default()
                    },
                    mute_output: true,
                },
            );
            assert!(matches!(result, Err(BeepError::InvalidConfiguration(_))));
        }
    }

    #[test]
    fn test_notes_do_not_overlap() {
        let mut seq = sequencer();
        seq.play_note("A", 0.1).unwrap();
        assert_eq!(seq.state(), SequencerState::Playing);
        seq.play_note("C5", 0.05).unwrap();

        let submissions = seq.device().submissions();
        assert_eq!(submissions.len(), 2);
        let gap = submissions[1].at.duration_since(submissions[0].at);
        assert!(gap >= Duration::from_millis(100), "gap was {:?}", gap);

        seq.finish();
    }

    #[test]
    fn test_submitted_buffer() {
        let mut seq = sequencer();
        seq.play_note("A", 0.05).unwrap();

        let submissions = seq.device().submissions();
        assert_eq!(submissions[0].channels, 1);
        assert_eq!(submissions[0].sample_rate, 44100);
        assert_eq!(submissions[0].samples.len(), 2205);
        seq.finish();
    }

    #[test]
    fn test_finish_drains_remaining_time() {
        let mut seq = sequencer();
        seq.play_note("E", 0.2).unwrap();

        let start = Instant::now();
        let waited = seq.finish();
        let elapsed = start.elapsed();

        assert!(waited <= Duration::from_millis(200));
        assert!(elapsed >= Duration::from_millis(150), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(300), "elapsed {:?}", elapsed);
    }

    #[test]
    fn test_finish_after_sound_ended_returns_at_once() {
        let mut seq = sequencer();
        seq.play_note("G", 0.02).unwrap();
        thread::sleep(Duration::from_millis(50));

        let start = Instant::now();
        assert_eq!(seq.finish(), Duration::ZERO);
        assert!(start.elapsed() < Duration::from_millis(20));
    }

    #[test]
    fn test_pause_blocks_without_submitting() {
        let mut seq = sequencer();
        let start = Instant::now();
        seq.play_note("pause", 0.05).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert!(seq.device().submissions().is_empty());
        assert_eq!(seq.state(), SequencerState::Idle);
        seq.finish();
    }

    #[test]
    fn test_pause_waits_for_previous_sound() {
        let mut seq = sequencer();
        let start = Instant::now();
        seq.play_note("A", 0.1).unwrap();
        seq.play_pause(0.05).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(150));
        seq.finish();
    }

    #[test]
    fn test_invalid_note_starts_nothing() {
        let mut seq = sequencer();
        seq.play_note("A", 0.2).unwrap();

        let start = Instant::now();
        assert!(matches!(
            seq.play_note("H", 0.2),
            Err(BeepError::InvalidNote(_))
        ));
        assert!(matches!(
            seq.play_note("A9", 0.2),
            Err(BeepError::InvalidOctave(_))
        ));
        assert!(matches!(
            seq.play_note("A4x", 0.2),
            Err(BeepError::InvalidAccidental(_))
        ));
        // Errors come back without waiting for the note in flight
        assert!(start.elapsed() < Duration::from_millis(100));
        assert_eq!(seq.device().submissions().len(), 1);
        seq.finish();
    }

    #[test]
    fn test_invalid_duration() {
        let mut seq = sequencer();
        assert!(matches!(
            seq.play_note("A", -1.0),
            Err(BeepError::InvalidDuration(_))
        ));
        assert!(matches!(
            seq.play_pause(f64::NAN),
            Err(BeepError::InvalidDuration(_))
        ));
        assert!(seq.device().submissions().is_empty());
    }

    #[test]
    fn test_play_track_blocks_until_done() {
        let mut seq = sequencer();
        // 50ms of stereo silence
        let track = vec![0i16; 2205 * 2];

        let start = Instant::now();
        seq.play_track(&track).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(seq.state(), SequencerState::Idle);

        let submissions = seq.device().submissions();
        assert_eq!(submissions[0].channels, 2);
        assert_eq!(submissions[0].samples.len(), 4410);
        seq.finish();
    }

    #[test]
    fn test_play_step() {
        let mut seq = sequencer();
        seq.play_step(&Step { note: 9, octave: 2, beats: 2 }, 0.025).unwrap();

        let start = Instant::now();
        // Zero beats rests for one beat after the previous note ends
        seq.play_step(&Step { note: -1, octave: -1, beats: 0 }, 0.025)
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(25));

        let submissions = seq.device().submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].samples.len(), 2205);
        seq.finish();
    }

    #[test]
    fn test_play_step_zero_beats_ignores_ids() {
        let mut seq = sequencer();
        let spb = 0.02;
        seq.play_step(&Step { note: 0, octave: 2, beats: 1 }, spb).unwrap();

        // Leftover ids on a silent step are never resolved
        let start = Instant::now();
        seq.play_step(&Step { note: 3, octave: -1, beats: 0 }, spb).unwrap();
        seq.play_step(&Step { note: 99, octave: 9, beats: 0 }, spb).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(40));
        assert_eq!(seq.device().submissions().len(), 1);

        // The same ids on a sounding step are still rejected
        assert!(matches!(
            seq.play_step(&Step { note: 3, octave: -1, beats: 1 }, spb),
            Err(BeepError::UnknownOctave(-1))
        ));
        seq.finish();
    }

    #[test]
    fn test_rest_step_lasts_its_beats() {
        let mut seq = sequencer();
        let start = Instant::now();
        seq.play_step(&Step { note: REST, octave: -1, beats: 3 }, 0.02).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(60));
        assert!(seq.device().submissions().is_empty());
        seq.finish();
    }

    struct BrokenHandle;

    impl PlaybackHandle for BrokenHandle {
        fn is_playing(&self) -> bool {
            true
        }

        fn wait_until_done(&self) -> Result<()> {
            Err(BeepError::Device("device unplugged".to_string()))
        }
    }

    /// Device whose streams die right after they start
    struct BrokenDevice;

    impl AudioDevice for BrokenDevice {
        type Handle = BrokenHandle;

        fn submit(&mut self, _: &[i16], _: u16, _: u32) -> Result<BrokenHandle> {
            Ok(BrokenHandle)
        }
    }

    #[test]
    fn test_device_failure_is_reported() {
        let mut seq = PlaybackSequencer::new(
            BrokenDevice,
            SequencerConfig {
                mute_output: true,
                ..Default::default()
            },
        )
        .unwrap();

        seq.play_note("A", 0.01).unwrap();
        assert!(matches!(seq.play_note("B", 0.01), Err(BeepError::Device(_))));
        assert!(matches!(seq.play_track(&[0; 4]), Err(BeepError::Device(_))));
    }
}
