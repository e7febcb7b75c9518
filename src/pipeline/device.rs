//! Audio output boundary
//!
//! The sequencer only needs three things from a sound device: submit a
//! finished buffer, ask whether it is still playing, and block until it is
//! done. [`CpalDevice`] does this on the default system output; [`SilentDevice`]
//! keeps the same timing without touching any hardware.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};
use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, error, info};

use crate::error::{BeepError, Result};

/// An in-progress sound owned by the device
pub trait PlaybackHandle {
    fn is_playing(&self) -> bool;

    /// Block until the submitted buffer has been played completely
    ///
    /// Fails with `Device` if the output broke down before the end.
    fn wait_until_done(&self) -> Result<()>;
}

/// Something that plays 16-bit PCM buffers asynchronously
pub trait AudioDevice {
    type Handle: PlaybackHandle;

    /// Start playing `samples` (interleaved when `channels > 1`) and return at once
    fn submit(&mut self, samples: &[i16], channels: u16, sample_rate: u32)
        -> Result<Self::Handle>;
}

/// Wall-clock length of an interleaved buffer
pub fn buffer_duration(len: usize, channels: u16, sample_rate: u32) -> Duration {
    if channels == 0 || sample_rate == 0 {
        return Duration::ZERO;
    }
    let frames = len / channels as usize;
    Duration::from_secs_f64(frames as f64 / sample_rate as f64)
}

fn device_error(err: impl std::fmt::Display) -> BeepError {
    BeepError::Device(err.to_string())
}

/// One stream layout a device can run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OutputFormat {
    channels: u16,
    sample_format: SampleFormat,
    min_rate: u32,
    max_rate: u32,
}

impl OutputFormat {
    fn supports(&self, sample_rate: u32) -> bool {
        matches!(
            self.sample_format,
            SampleFormat::F32 | SampleFormat::I16 | SampleFormat::U16
        ) && (self.min_rate..=self.max_rate).contains(&sample_rate)
    }
}

/// Pick a layout that runs at `sample_rate`
///
/// The preferred channel count and sample format win when the device
/// offers them at that rate, then the preferred channel count alone.
fn choose_format(
    formats: &[OutputFormat],
    preferred: (u16, SampleFormat),
    sample_rate: u32,
) -> Option<(u16, SampleFormat)> {
    let usable: Vec<&OutputFormat> = formats.iter().filter(|f| f.supports(sample_rate)).collect();
    usable
        .iter()
        .find(|f| (f.channels, f.sample_format) == preferred)
        .or_else(|| usable.iter().find(|f| f.channels == preferred.0))
        .or_else(|| usable.first())
        .map(|f| (f.channels, f.sample_format))
}

/// Default system output through cpal
pub struct CpalDevice {
    device: cpal::Device,
    sample_format: SampleFormat,
    channels: u16,
    formats: Vec<OutputFormat>,
}

impl CpalDevice {
    /// Open the default output device of the default host
    pub fn open_default() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| BeepError::Device("no output device available".to_string()))?;
        let config = device.default_output_config().map_err(device_error)?;
        let formats = device
            .supported_output_configs()
            .map_err(device_error)?
            .map(|range| OutputFormat {
                channels: range.channels(),
                sample_format: range.sample_format(),
                min_rate: range.min_sample_rate().0,
                max_rate: range.max_sample_rate().0,
            })
            .collect();

        info!(
            "Using output device {} on {} ({:?}, {} channels)",
            device.name().unwrap_or_else(|_| "<unnamed>".to_string()),
            host.id().name(),
            config.sample_format(),
            config.channels()
        );

        Ok(Self {
            device,
            sample_format: config.sample_format(),
            channels: config.channels(),
            formats,
        })
    }
}

impl AudioDevice for CpalDevice {
    type Handle = CpalHandle;

    fn submit(&mut self, samples: &[i16], channels: u16, sample_rate: u32) -> Result<CpalHandle> {
        let (device_channels, sample_format) = choose_format(
            &self.formats,
            (self.channels, self.sample_format),
            sample_rate,
        )
        .ok_or_else(|| {
            let rates: Vec<String> = self
                .formats
                .iter()
                .map(|f| format!("{}-{} Hz", f.min_rate, f.max_rate))
                .collect();
            BeepError::Device(format!(
                "output device cannot play {} Hz audio (supported: {})",
                sample_rate,
                rates.join(", ")
            ))
        })?;

        let samples: Arc<[i16]> = remix(samples, channels, device_channels).into();
        let config = cpal::StreamConfig {
            channels: device_channels,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let (notifier, completion) = completion();
        let cursor = Cursor::new(samples);

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&self.device, &config, cursor, notifier),
            SampleFormat::I16 => build_stream::<i16>(&self.device, &config, cursor, notifier),
            SampleFormat::U16 => build_stream::<u16>(&self.device, &config, cursor, notifier),
            other => {
                return Err(BeepError::Device(format!(
                    "unsupported sample format {:?}",
                    other
                )))
            }
        }?;
        stream.play().map_err(device_error)?;

        Ok(CpalHandle {
            _stream: stream,
            completion,
        })
    }
}

/// Spread interleaved `from`-channel audio over `to` channels
///
/// Output channel `c` takes input channel `min(c, from - 1)`, so mono is
/// duplicated to every speaker and extra input channels are dropped.
fn remix(samples: &[i16], from: u16, to: u16) -> Vec<i16> {
    if from == to || from == 0 || to == 0 {
        return samples.to_vec();
    }
    let (from, to) = (from as usize, to as usize);
    let mut out = Vec::with_capacity(samples.len() / from * to);
    for frame in samples.chunks_exact(from) {
        for c in 0..to {
            out.push(frame[c.min(from - 1)]);
        }
    }
    out
}

/// Feeds one buffer to the device period by period, then silence
struct Cursor {
    samples: Arc<[i16]>,
    position: usize,
}

impl Cursor {
    fn new(samples: Arc<[i16]>) -> Self {
        Self {
            samples,
            position: 0,
        }
    }

    /// Fill one device period
    ///
    /// Returns true once a whole period of silence follows the last sample,
    /// which means the buffer itself has been handed on in full.
    fn fill<T>(&mut self, data: &mut [T]) -> bool
    where
        T: SizedSample + FromSample<i16>,
    {
        let drained = self.position >= self.samples.len();
        for sample in data.iter_mut() {
            *sample = match self.samples.get(self.position) {
                Some(&s) => {
                    self.position += 1;
                    T::from_sample(s)
                }
                None => T::EQUILIBRIUM,
            };
        }
        drained
    }
}

/// Stream side of the completion signal
///
/// Exactly one outcome is ever sent: the end of the buffer or the first
/// stream error, whichever comes first.
#[derive(Clone)]
struct Notifier {
    playing: Arc<AtomicBool>,
    done: Sender<std::result::Result<(), String>>,
}

impl Notifier {
    fn finish(&self) {
        if self.playing.swap(false, Ordering::AcqRel) {
            let _ = self.done.try_send(Ok(()));
        }
    }

    fn fail(&self, reason: String) {
        if self.playing.swap(false, Ordering::AcqRel) {
            let _ = self.done.try_send(Err(reason));
        }
    }
}

/// Handle side of the completion signal
struct Completion {
    playing: Arc<AtomicBool>,
    done: Receiver<std::result::Result<(), String>>,
    /// Outcome already taken off the channel
    settled: AtomicBool,
}

fn completion() -> (Notifier, Completion) {
    let playing = Arc::new(AtomicBool::new(true));
    let (tx, rx) = bounded(1);
    (
        Notifier {
            playing: playing.clone(),
            done: tx,
        },
        Completion {
            playing,
            done: rx,
            settled: AtomicBool::new(false),
        },
    )
}

impl Completion {
    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    fn wait(&self) -> Result<()> {
        if self.settled.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        match self.done.recv() {
            Ok(Ok(())) => Ok(()),
            Ok(Err(reason)) => Err(BeepError::Device(reason)),
            Err(_) => Err(BeepError::Device(
                "audio stream closed before the buffer finished".to_string(),
            )),
        }
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut cursor: Cursor,
    notifier: Notifier,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<i16>,
{
    let on_error = notifier.clone();
    let err_fn = move |err: cpal::StreamError| {
        error!("an error occurred on the audio stream: {}", err);
        on_error.fail(err.to_string());
    };

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                if cursor.fill(data) {
                    notifier.finish();
                }
            },
            err_fn,
            None,
        )
        .map_err(device_error)
}

/// A buffer playing on a cpal stream; dropping it stops the stream
pub struct CpalHandle {
    _stream: cpal::Stream,
    completion: Completion,
}

impl PlaybackHandle for CpalHandle {
    fn is_playing(&self) -> bool {
        self.completion.is_playing()
    }

    fn wait_until_done(&self) -> Result<()> {
        self.completion.wait()
    }
}

/// Record of one buffer handed to a [`SilentDevice`]
#[derive(Debug, Clone)]
pub struct Submission {
    pub samples: Vec<i16>,
    pub channels: u16,
    pub sample_rate: u32,
    pub at: Instant,
}

/// Device that "plays" buffers in real time without producing sound
///
/// Handles report playing for exactly the buffer's duration. Every
/// submission is recorded, which makes it useful for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct SilentDevice {
    log: Arc<Mutex<Vec<Submission>>>,
}

impl SilentDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submissions(&self) -> Vec<Submission> {
        match self.log.lock() {
            Ok(log) => log.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl AudioDevice for SilentDevice {
    type Handle = SilentHandle;

    fn submit(&mut self, samples: &[i16], channels: u16, sample_rate: u32) -> Result<SilentHandle> {
        let at = Instant::now();
        let ends_at = at + buffer_duration(samples.len(), channels, sample_rate);
        debug!(
            "Silent device accepted {} samples ({} channels @ {} Hz)",
            samples.len(),
            channels,
            sample_rate
        );

        let submission = Submission {
            samples: samples.to_vec(),
            channels,
            sample_rate,
            at,
        };
        match self.log.lock() {
            Ok(mut log) => log.push(submission),
            Err(poisoned) => poisoned.into_inner().push(submission),
        }

        Ok(SilentHandle { ends_at })
    }
}

pub struct SilentHandle {
    ends_at: Instant,
}

impl PlaybackHandle for SilentHandle {
    fn is_playing(&self) -> bool {
        Instant::now() < self.ends_at
    }

    fn wait_until_done(&self) -> Result<()> {
        std::thread::sleep(self.ends_at.saturating_duration_since(Instant::now()));
        Ok(())
    }
}
