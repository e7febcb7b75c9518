use log::warn;

use super::{Step, BEATS_PER_BAR};
use crate::error::Result;
use crate::generator::{sample_count, SynthConfig, ToneSynth};

/// Stereo frames, `[left, right]`, at int16 scale before normalization
pub type StereoBuffer = Vec<[f64; 2]>;

/// Per-channel gain applied when a voice is mixed into a bar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Balance {
    pub left: f64,
    pub right: f64,
}

impl Default for Balance {
    fn default() -> Self {
        Self {
            left: 1.0,
            right: 1.0,
        }
    }
}

/// Lays out the steps of one voice into a stereo bar
pub struct BarMixer {
    synth: ToneSynth,
    balance: Balance,
    beats_per_bar: u32,
}

impl BarMixer {
    pub fn new(config: SynthConfig, balance: Balance) -> Result<Self> {
        Ok(Self {
            synth: ToneSynth::new(config)?,
            balance,
            beats_per_bar: BEATS_PER_BAR,
        })
    }

    pub fn synth(&self) -> &ToneSynth {
        &self.synth
    }

    pub fn balance(&self) -> Balance {
        self.balance
    }

    /// Frames in one bar at the given beat length
    pub fn bar_len(&self, seconds_per_beat: f64) -> usize {
        sample_count(
            self.beats_per_bar as f64 * seconds_per_beat,
            self.synth.sample_rate(),
        )
    }

    /// A silent bar, ready for [`BarMixer::layout_bar`]
    pub fn allocate_bar(&self, seconds_per_beat: f64) -> StereoBuffer {
        vec![[0.0; 2]; self.bar_len(seconds_per_beat)]
    }

    /// Add the tones of `steps` into `buffer`, one after the other
    ///
    /// Each step starts where the previous one ended and lasts
    /// `beats * seconds_per_beat`. Zero-beat steps neither sound nor advance
    /// the position; rests advance it in silence. The tone is added on top
    /// of what is already in the buffer, so several voices can share a bar.
    /// Audio past the end of the buffer is dropped.
    ///
    /// All steps are resolved before anything is mixed, so an invalid step
    /// leaves the buffer untouched.
    pub fn layout_bar(
        &self,
        buffer: &mut [[f64; 2]],
        steps: &[Step],
        seconds_per_beat: f64,
    ) -> Result<()> {
        let notes = steps
            .iter()
            .filter(|step| step.beats > 0)
            .map(|step| Ok((step.note()?, step.beats)))
            .collect::<Result<Vec<_>>>()?;

        let Balance { left, right } = self.balance;
        let mut beat_tail = 0usize;

        for (note, beats) in notes {
            let duration = beats as f64 * seconds_per_beat;
            let audio = self.synth.render_note(&note, duration);
            let beat_head = beat_tail + audio.len();

            let end = beat_head.min(buffer.len());
            if end < beat_head {
                warn!(
                    "{} for {} beats overruns the bar by {} samples, truncating",
                    note,
                    beats,
                    beat_head - end
                );
            }

            if beat_tail < end {
                for (frame, sample) in buffer[beat_tail..end].iter_mut().zip(&audio) {
                    frame[0] += left * sample;
                    frame[1] += right * sample;
                }
            }

            beat_tail = beat_head;
        }

        Ok(())
    }
}
