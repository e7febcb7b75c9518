use log::{debug, info, warn};

use super::bar::{Balance, BarMixer};
use super::{Bar, Tempo, Tune};
use crate::error::Result;
use crate::generator::tone::FULL_SCALE;
use crate::generator::SynthConfig;

/// Builds interleaved stereo 16-bit tracks from melody and harmony bars
///
/// Every bar is normalized on its own, so a quiet bar comes out as loud as
/// a busy one. Loudness relative to neighbouring bars is not preserved.
pub struct TrackAssembler {
    mixer: BarMixer,
}

impl TrackAssembler {
    pub fn new(config: SynthConfig, balance: Balance) -> Result<Self> {
        Ok(Self {
            mixer: BarMixer::new(config, balance)?,
        })
    }

    pub fn mixer(&self) -> &BarMixer {
        &self.mixer
    }

    pub fn sample_rate(&self) -> u32 {
        self.mixer.synth().sample_rate()
    }

    /// Mix each melody bar with its harmony bar and concatenate the results
    ///
    /// Bars are paired in order; bars without a partner are dropped.
    pub fn build_track(&self, melody: &[Bar], harmony: &[Bar], tempo: Tempo) -> Result<Vec<i16>> {
        let seconds_per_beat = tempo.seconds_per_beat();
        if melody.len() != harmony.len() {
            warn!(
                "Melody has {} bars but harmony has {}, extra bars are ignored",
                melody.len(),
                harmony.len()
            );
        }

        let bars = melody.len().min(harmony.len());
        let mut track = Vec::with_capacity(bars * self.mixer.bar_len(seconds_per_beat) * 2);

        for (index, (melody_bar, harmony_bar)) in melody.iter().zip(harmony).enumerate() {
            let mut bar = self.mixer.allocate_bar(seconds_per_beat);
            self.mixer.layout_bar(&mut bar, melody_bar, seconds_per_beat)?;
            self.mixer.layout_bar(&mut bar, harmony_bar, seconds_per_beat)?;

            let scale = normalize_frames(&mut bar);
            debug!(
                "Bar {}: {} frames, normalization scale {:.4}",
                index + 1,
                bar.len(),
                scale
            );

            track.extend(bar.iter().flat_map(|&[l, r]| [l as i16, r as i16]));
        }

        Ok(track)
    }

    /// Build the track of a whole tune at its own tempo
    pub fn build_tune(&self, tune: &Tune) -> Result<Vec<i16>> {
        info!(
            "Building '{}': {} bars at tempo {} ({} ms per beat)",
            tune.name,
            tune.bar_count(),
            tune.tempo.label(),
            tune.tempo.sixteenth_ms()
        );
        self.build_track(&tune.melody, &tune.harmony, tune.tempo)
    }
}

/// Scale both channels together so the loudest sample hits full scale
fn normalize_frames(frames: &mut [[f64; 2]]) -> f64 {
    let max = frames
        .iter()
        .flatten()
        .fold(0.0f64, |acc, s| acc.max(s.abs()));
    if max == 0.0 {
        return 0.0;
    }
    let scale = FULL_SCALE / max;
    for sample in frames.iter_mut().flatten() {
        *sample *= scale;
    }
    scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BeepError;
    use crate::tune::{Step, REST};

    fn assembler() -> TrackAssembler {
        TrackAssembler::new(SynthConfig::default(), Balance::default()).unwrap()
    }

    fn step(note: i32, octave: i32, beats: u32) -> Step {
        Step { note, octave, beats }
    }

    #[test]
    fn test_track_length_is_sum_of_bars() {
        let assembler = assembler();
        let melody = vec![vec![step(0, 2, 16)], vec![step(2, 2, 8)], vec![]];
        let harmony = vec![vec![step(7, 1, 16)], vec![], vec![step(4, 1, 4)]];

        for tempo in [Tempo::Slow, Tempo::Medium, Tempo::Fast, Tempo::ExtraFast] {
            let track = assembler.build_track(&melody, &harmony, tempo).unwrap();
            let bar_len = assembler.mixer().bar_len(tempo.seconds_per_beat());
            assert_eq!(track.len(), 3 * bar_len * 2);
        }
    }

    #[test]
    fn test_each_bar_is_normalized() {
        let assembler = assembler();
        let melody = vec![vec![step(9, 2, 16)], vec![step(9, 2, 16)]];
        let harmony = vec![vec![step(9, 2, 16)], vec![]];

        let track = assembler.build_track(&melody, &harmony, Tempo::Fast).unwrap();
        let bar_len = assembler.mixer().bar_len(0.125) * 2;
        assert_eq!(track.len(), 2 * bar_len);

        // Both bars peak at full scale even though the first has twice the signal
        for bar in track.chunks(bar_len) {
            let peak = bar.iter().map(|s| s.unsigned_abs()).max().unwrap();
            assert!(peak >= 32766, "bar peak {}", peak);
        }
    }

    #[test]
    fn test_silent_bar_stays_silent() {
        let assembler = assembler();
        let melody = vec![vec![step(REST, -1, 16)]];
        let harmony = vec![vec![]];

        let track = assembler.build_track(&melody, &harmony, Tempo::ExtraFast).unwrap();
        assert!(!track.is_empty());
        assert!(track.iter().all(|&s| s == 0));
    }

    #[test]
    fn test_channels_follow_balance() {
        let assembler = TrackAssembler::new(
            SynthConfig::default(),
            Balance {
                left: 1.0,
                right: 0.0,
            },
        )
        .unwrap();
        let melody = vec![vec![step(0, 2, 16)]];
        let harmony = vec![vec![]];

        let track = assembler.build_track(&melody, &harmony, Tempo::Fast).unwrap();
        assert!(track.chunks(2).all(|frame| frame[1] == 0));
        assert!(track.chunks(2).any(|frame| frame[0] != 0));
    }

    #[test]
    fn test_unpaired_bars_are_dropped() {
        let assembler = assembler();
        let melody = vec![vec![step(0, 2, 16)], vec![step(0, 2, 16)]];
        let harmony = vec![vec![step(7, 1, 16)]];

        let track = assembler.build_track(&melody, &harmony, Tempo::Fast).unwrap();
        assert_eq!(track.len(), assembler.mixer().bar_len(0.125) * 2);
    }

    #[test]
    fn test_invalid_step_fails_build() {
        let assembler = assembler();
        let melody = vec![vec![step(0, 7, 4)]];
        let harmony = vec![vec![]];

        let result = assembler.build_track(&melody, &harmony, Tempo::Fast);
        assert!(matches!(result, Err(BeepError::UnknownOctave(7))));
    }

    #[test]
    fn test_normalize_frames() {
        let mut frames = vec![[1.0, -4.0], [2.0, 0.5]];
        let scale = normalize_frames(&mut frames);
        assert!((scale - 32767.0 / 4.0).abs() < 1e-9);
        assert_eq!(frames[0][1], -32767.0);

        let mut silent = vec![[0.0, 0.0]; 3];
        assert_eq!(normalize_frames(&mut silent), 0.0);
    }
}
