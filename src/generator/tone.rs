//! Tone synthesis
//!
//! Renders one note for one duration into a mono buffer at int16 scale:
//! an ideal square wave, normalized to full range, scaled by the volume and
//! tapered at both edges so the tone starts and stops without a click.
//!
//! Buffers stay `f64` so they can be mixed further; [`quantize`] converts to
//! 16-bit samples right before playback or after the final mix-down.

use log::debug;

use super::ramp::Envelope;
use super::square::SquareGenerator;
use super::SignalGenerator;
use crate::error::{BeepError, Result};
use crate::pitch::Note;

/// Peak value of a normalized buffer
pub const FULL_SCALE: f64 = 32767.0;

/// Number of samples covering `seconds` at `sample_rate`
///
/// Every seconds-to-samples conversion goes through here so that a tone and
/// the slot it is mixed into always agree on length.
pub fn sample_count(seconds: f64, sample_rate: u32) -> usize {
    (seconds * sample_rate as f64).round().max(0.0) as usize
}

/// Convert int16-scale samples to 16-bit integers
///
/// Truncates toward zero and saturates at the i16 range.
pub fn quantize(samples: &[f64]) -> Vec<i16> {
    samples.iter().map(|&s| s as i16).collect()
}

/// Scale `samples` so that the largest magnitude becomes `peak`
///
/// All-zero buffers are left silent. Returns the applied scale factor.
pub fn normalize(samples: &mut [f64], peak: f64) -> f64 {
    let max = samples.iter().fold(0.0f64, |acc, s| acc.max(s.abs()));
    if max == 0.0 {
        return 0.0;
    }
    let scale = peak / max;
    for sample in samples.iter_mut() {
        *sample *= scale;
    }
    scale
}

/// Synthesizer settings
#[derive(Debug, Clone, PartialEq)]
pub struct SynthConfig {
    /// Output volume, 0.0 to 1.0
    pub volume: f64,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Length of each edge fade in samples
    pub fade_len: usize,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            volume: 0.3,
            sample_rate: 44100,
            fade_len: 800,
        }
    }
}

impl SynthConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(BeepError::InvalidConfiguration(format!(
                "volume must be between 0 and 1, got {}",
                self.volume
            )));
        }
        if self.sample_rate == 0 {
            return Err(BeepError::InvalidConfiguration(
                "sample rate must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Square-wave tone synthesizer
#[derive(Debug, Clone)]
pub struct ToneSynth {
    config: SynthConfig,
    envelope: Envelope,
}

impl ToneSynth {
    /// Create a synthesizer, rejecting out-of-range settings
    ///
    /// # Example
    /// ```
    /// use beeps::generator::{SynthConfig, ToneSynth};
    ///
    /// let synth = ToneSynth::new(SynthConfig::default()).unwrap();
    /// let samples = synth.render(440.0, 0.5);
    /// assert_eq!(samples.len(), 22050);
    ///
    /// assert!(ToneSynth::new(SynthConfig { volume: 1.5, ..Default::default() }).is_err());
    /// ```
    pub fn new(config: SynthConfig) -> Result<Self> {
        config.validate()?;
        let envelope = Envelope::new(config.fade_len);
        Ok(Self { config, envelope })
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    pub fn volume(&self) -> f64 {
        self.config.volume
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Render a square tone of `frequency` Hz lasting `duration` seconds
    pub fn render(&self, frequency: f64, duration: f64) -> Vec<f64> {
        let n = sample_count(duration, self.config.sample_rate);
        let mut samples = vec![0.0f64; n];

        SquareGenerator::new(frequency, duration, n).process(&mut samples);

        normalize(&mut samples, FULL_SCALE);
        for sample in samples.iter_mut() {
            *sample *= self.config.volume;
        }

        let faded = self.envelope.apply(&mut samples);
        debug!(
            "Rendered {:.2} Hz for {}s: {} samples{}",
            frequency,
            duration,
            n,
            if faded { "" } else { " (too short to fade)" }
        );

        samples
    }

    /// Silence lasting `duration` seconds
    pub fn silence(&self, duration: f64) -> Vec<f64> {
        vec![0.0; sample_count(duration, self.config.sample_rate)]
    }

    /// Render a note or a pause
    pub fn render_note(&self, note: &Note, duration: f64) -> Vec<f64> {
        match note.frequency() {
            Some(frequency) => self.render(frequency, duration),
            None => self.silence(duration),
        }
    }

    /// Render a note and quantize it for direct playback
    pub fn render_pcm(&self, note: &Note, duration: f64) -> Vec<i16> {
        quantize(&self.render_note(note, duration))
    }
}
