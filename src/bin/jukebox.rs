//! Build a two-voice tune into a stereo track and play it
//!
//! Usage: jukebox <tune.json> [--volume 0.3] [--wav out.wav]

use std::path::PathBuf;

use anyhow::{Context, Result};
use beeps::generator::SynthConfig;
use beeps::pipeline::{CpalDevice, PlaybackSequencer, SequencerConfig};
use beeps::tune::{load_tune, Balance, TrackAssembler, Tune};
use beeps::wav::write_wav_16bit;
use clap::Parser;
use env_logger::{Builder, Env};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "jukebox")]
#[command(about = "Play a melody/harmony tune file", long_about = None)]
struct Cli {
    /// Tune file in JSON
    tune: PathBuf,

    /// Output volume 0.0-1.0
    #[arg(short, long, default_value = "0.3")]
    volume: f64,

    /// Left channel gain
    #[arg(long, default_value = "1.0")]
    left: f64,

    /// Right channel gain
    #[arg(long, default_value = "1.0")]
    right: f64,

    /// Write the track to this WAV file instead of playing it
    #[arg(short, long)]
    wav: Option<PathBuf>,

    /// Beep the melody note by note instead of playing the mixed track
    #[arg(long)]
    steps: bool,
}

fn play_steps(tune: &Tune, config: SequencerConfig) -> Result<()> {
    let mut sequencer = PlaybackSequencer::new(CpalDevice::open_default()?, config)?;
    let seconds_per_beat = tune.tempo.seconds_per_beat();
    for step in tune.melody.iter().flatten() {
        sequencer.play_step(step, seconds_per_beat)?;
    }
    sequencer.finish();
    Ok(())
}

fn main() -> Result<()> {
    Builder::from_env(Env::default().default_filter_or(LevelFilter::Info.to_string())).init();
    let cli = Cli::parse();

    let tune = load_tune(&cli.tune).with_context(|| format!("loading {}", cli.tune.display()))?;
    tune.validate()?;

    println!("{}", tune.name);
    println!("  Tempo: {} ({} ms per beat)", tune.tempo.label(), tune.tempo.sixteenth_ms());
    println!("  Bars: {}", tune.bar_count());
    println!();

    let synth = SynthConfig {
        volume: cli.volume,
        ..Default::default()
    };

    if cli.steps {
        return play_steps(
            &tune,
            SequencerConfig {
                synth,
                mute_output: false,
            },
        );
    }

    let balance = Balance {
        left: cli.left,
        right: cli.right,
    };
    let assembler = TrackAssembler::new(synth.clone(), balance)?;
    let track = assembler.build_tune(&tune)?;

    match &cli.wav {
        Some(output) => {
            write_wav_16bit(output, &track, 2, assembler.sample_rate())
                .with_context(|| format!("writing {}", output.display()))?;
            println!("✓ Generated {}", output.display());
        }
        None => {
            let mut sequencer = PlaybackSequencer::new(
                CpalDevice::open_default()?,
                SequencerConfig {
                    synth,
                    mute_output: false,
                },
            )?;
            sequencer.play_track(&track)?;
            sequencer.finish();
        }
    }

    Ok(())
}
