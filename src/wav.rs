//! WAV file writer utility
//!
//! Writes 16-bit PCM through hound. Samples are expected already quantized;
//! multi-channel buffers are interleaved.

use std::path::Path;

use log::debug;

use crate::error::{BeepError, Result};

/// Write a 16-bit PCM WAV file
///
/// # Example
/// ```
/// use beeps::wav::write_wav_16bit;
///
/// let dir = std::env::temp_dir().join("beeps-doc.wav");
/// let samples = vec![0i16; 44100]; // 1 second of mono silence
/// write_wav_16bit(&dir, &samples, 1, 44100).unwrap();
/// ```
pub fn write_wav_16bit(
    path: impl AsRef<Path>,
    samples: &[i16],
    channels: u16,
    sample_rate: u32,
) -> Result<()> {
    if channels == 0 || sample_rate == 0 {
        return Err(BeepError::InvalidConfiguration(format!(
            "cannot write {} channels at {} Hz",
            channels, sample_rate
        )));
    }

    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path.as_ref(), spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    debug!(
        "Wrote {} samples ({} channels, {} Hz) to {}",
        samples.len(),
        channels,
        sample_rate,
        path.as_ref().display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_wav_silence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("silence.wav");
        write_wav_16bit(&path, &[0i16; 100], 1, 44100).unwrap();

        let metadata = std::fs::metadata(&path).unwrap();
        assert!(metadata.len() > 44); // header plus data
    }

    #[test]
    fn test_write_wav_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav_16bit(&path, &[1, -1, 2, -2], 2, 22050).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 22050);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);
        assert_eq!(reader.duration(), 2);
    }

    #[test]
    fn test_write_wav_full_scale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("full.wav");
        let samples = [i16::MAX, i16::MIN, 16383, -16384, 0];
        write_wav_16bit(&path, &samples, 1, 44100).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(read, samples);
    }

    #[test]
    fn test_write_wav_rejects_zero_channels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.wav");
        assert!(matches!(
            write_wav_16bit(&path, &[0], 0, 44100),
            Err(BeepError::InvalidConfiguration(_))
        ));
        assert!(!path.exists());
    }
}
