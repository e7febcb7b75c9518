//! Render one tone and plot its edges to SVG
//!
//! Usage: plot-tone <note> <duration> <output.svg> [--window-ms 30]
//!
//! Fails if the tone starts or ends with a click, i.e. if the fades do not
//! bring the first and last samples close to zero.

use std::ops::Range;
use std::path::PathBuf;

use anyhow::{bail, Result};
use beeps::generator::{SynthConfig, ToneSynth};
use beeps::pitch::Note;
use clap::Parser;
use env_logger::{Builder, Env};
use log::LevelFilter;
use plotters::prelude::*;

#[derive(Parser)]
#[command(name = "plot-tone")]
#[command(about = "Plot the start and end of a rendered tone", long_about = None)]
struct Cli {
    /// Note token, e.g. A4 or C5#
    note: String,

    /// Duration in seconds
    duration: f64,

    /// Output SVG path
    output: PathBuf,

    /// Milliseconds shown at each end of the tone
    #[arg(short, long, default_value = "30")]
    window_ms: f64,

    /// Output volume 0.0-1.0
    #[arg(short, long, default_value = "0.3")]
    volume: f64,
}

fn check_edges(samples: &[f64], peak: f64, fade_len: usize) -> Result<()> {
    let (first, last) = match (samples.first(), samples.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => bail!("Rendered tone is empty"),
    };

    // The last fade-out step leaves peak / fade_len; allow twice that
    let limit = 2.0 * peak / fade_len as f64;
    if first.abs() > limit {
        bail!("CLICK at start: first sample is {:.1} (limit {:.1})", first, limit);
    }
    if last.abs() > limit {
        bail!("CLICK at end: last sample is {:.1} (limit {:.1})", last, limit);
    }

    println!(
        "  ✓ Edges: first {:.1}, last {:.1} (below {:.1})",
        first, last, limit
    );
    Ok(())
}

fn draw_window(
    area: &DrawingArea<SVGBackend<'_>, plotters::coord::Shift>,
    title: &str,
    samples: &[f64],
    range: Range<usize>,
    sample_rate: u32,
    peak: f64,
) -> Result<()> {
    let to_ms = |i: usize| i as f64 * 1000.0 / sample_rate as f64;
    let x_range = to_ms(range.start)..to_ms(range.end.max(range.start + 1));
    let y_max = (peak * 1.1).max(1.0);

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, -y_max..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Time (ms)")
        .y_desc("Amplitude")
        .x_labels(10)
        .y_labels(8)
        .draw()?;

    chart.draw_series(LineSeries::new(
        range.clone().map(|i| (to_ms(i), samples[i])),
        BLUE.stroke_width(1),
    ))?;

    Ok(())
}

fn main() -> Result<()> {
    Builder::from_env(Env::default().default_filter_or(LevelFilter::Info.to_string())).init();
    let cli = Cli::parse();
    let note: Note = cli.note.parse()?;

    let synth = ToneSynth::new(SynthConfig {
        volume: cli.volume,
        ..Default::default()
    })?;
    let frequency = match note.frequency() {
        Some(frequency) => frequency,
        None => bail!("Nothing to plot for a pause"),
    };

    println!("Tone Plot Generator");
    println!("===================");
    println!("  Note: {} ({:.2} Hz)", note, frequency);
    println!("  Duration: {}s", cli.duration);
    println!("  Volume: {}", cli.volume);
    println!();

    let samples = synth.render(frequency, cli.duration);
    let peak = 32767.0 * synth.volume();
    let fade_len = synth.envelope().fade_len();
    println!("  Rendered {} samples", samples.len());

    if samples.len() > fade_len {
        check_edges(&samples, peak, fade_len)?;
    } else {
        println!("  Tone is too short to fade, skipping edge check");
    }

    let window = ((cli.window_ms / 1000.0 * synth.sample_rate() as f64) as usize)
        .clamp(1, samples.len().max(1));
    let head = 0..window.min(samples.len());
    let tail = samples.len().saturating_sub(window)..samples.len();

    print!("  Creating plot... ");
    let root = SVGBackend::new(&cli.output, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let (top, bottom) = root.split_vertically(300);

    draw_window(
        &top,
        &format!("{} start ({:.2} Hz)", note, frequency),
        &samples,
        head,
        synth.sample_rate(),
        peak,
    )?;
    draw_window(
        &bottom,
        &format!("{} end ({}s)", note, cli.duration),
        &samples,
        tail,
        synth.sample_rate(),
        peak,
    )?;
    root.present()?;
    println!("done");

    println!();
    println!("Output: {}", cli.output.display());
    Ok(())
}
