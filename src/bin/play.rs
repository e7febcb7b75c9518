//! Play a note script through the default audio device
//!
//! Usage: play <script.txt|dir>... [--volume 0.3] [--mute] [--wav out.wav]
//!
//! Directories are expanded to the scripts they contain, in name order.
//! With `--wav` everything is rendered to one mono WAV file instead of played.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use beeps::generator::{SynthConfig, ToneSynth};
use beeps::pipeline::{
    load_script, AudioDevice, CpalDevice, PlaybackSequencer, ScriptStep, SequencerConfig,
    SilentDevice,
};
use beeps::wav::write_wav_16bit;
use clap::Parser;
use env_logger::{Builder, Env};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "play")]
#[command(about = "Play a note:duration script as square-wave beeps", long_about = None)]
struct Cli {
    /// Script files or directories of scripts, one `note:seconds` per line
    #[arg(required = true)]
    scripts: Vec<PathBuf>,

    /// Output volume 0.0-1.0
    #[arg(short, long, default_value = "0.3")]
    volume: f64,

    /// Do not log each note as it plays
    #[arg(short, long)]
    mute: bool,

    /// Render to this WAV file instead of playing
    #[arg(short, long)]
    wav: Option<PathBuf>,

    /// Keep the timing but send nothing to the sound card
    #[arg(long)]
    silent: bool,
}

/// Expand directories into their files, sorted by name
fn collect_scripts(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut scripts = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries = fs::read_dir(path)
                .with_context(|| format!("reading {}", path.display()))?
                .map(|entry| entry.map(|e| e.path()))
                .collect::<std::io::Result<Vec<_>>>()?;
            entries.retain(|p| p.is_file());
            entries.sort();
            scripts.extend(entries);
        } else {
            scripts.push(path.clone());
        }
    }
    Ok(scripts)
}

fn play<D: AudioDevice>(device: D, config: SequencerConfig, steps: &[ScriptStep]) -> Result<()> {
    let mut sequencer = PlaybackSequencer::new(device, config)?;
    for step in steps {
        sequencer.play(&step.note, step.duration)?;
    }
    sequencer.finish();
    Ok(())
}

fn render(config: SynthConfig, steps: &[ScriptStep], output: &Path) -> Result<()> {
    let synth = ToneSynth::new(config)?;
    let samples: Vec<i16> = steps
        .iter()
        .flat_map(|step| synth.render_pcm(&step.note, step.duration))
        .collect();

    write_wav_16bit(output, &samples, 1, synth.sample_rate())
        .with_context(|| format!("writing {}", output.display()))?;
    println!(
        "✓ Generated {} ({:.2}s)",
        output.display(),
        samples.len() as f64 / synth.sample_rate() as f64
    );
    Ok(())
}

fn main() -> Result<()> {
    Builder::from_env(Env::default().default_filter_or(LevelFilter::Info.to_string())).init();
    let cli = Cli::parse();

    let mut steps = Vec::new();
    for script in collect_scripts(&cli.scripts)? {
        let loaded =
            load_script(&script).with_context(|| format!("loading {}", script.display()))?;
        println!("Loaded {} ({} steps)", script.display(), loaded.len());
        steps.extend(loaded);
    }

    let config = SequencerConfig {
        synth: SynthConfig {
            volume: cli.volume,
            ..Default::default()
        },
        mute_output: cli.mute,
    };

    match &cli.wav {
        Some(output) => render(config.synth, &steps, output),
        None if cli.silent => play(SilentDevice::new(), config, &steps),
        None => play(CpalDevice::open_default()?, config, &steps),
    }
}
