use beeps::generator::{GeneratorState, SignalGenerator, SquareGenerator, SynthConfig, ToneSynth};
use beeps::pitch::{Accidental, Letter, NoteToken, MAX_OCTAVE};
use beeps::tune::{Balance, BarMixer, Tempo};

fn demo_pitch_table() -> beeps::Result<()> {
    println!("\n=== Pitch Table (Hz) ===\n");

    print!("{:<6}", "Note");
    for octave in 0..=MAX_OCTAVE {
        print!("{:>10}", octave);
    }
    println!();
    println!("{}", "-".repeat(6 + 10 * (MAX_OCTAVE as usize + 1)));

    for letter in Letter::ALL {
        for accidental in [None, Some(Accidental::Sharp)] {
            // No sharps between E/F and B/C
            if accidental.is_some() && matches!(letter, Letter::E | Letter::B) {
                continue;
            }
            let name = match accidental {
                Some(a) => format!("{}{}", letter.as_char(), a.symbol()),
                None => letter.as_char().to_string(),
            };
            print!("{:<6}", name);
            for octave in 0..=MAX_OCTAVE {
                let token = NoteToken::new(letter, octave, accidental)?;
                print!("{:>10.2}", token.frequency());
            }
            println!();
        }
    }
    Ok(())
}

fn demo_square() {
    println!("\n=== Square Generator Demo ===\n");

    // 10ms of A4 at 44.1kHz, processed in 64-sample frames
    let total_samples = 441;
    let frame_size = 64;
    let mut square = SquareGenerator::new(440.0, 0.01, total_samples);

    println!("Configuration:");
    println!("  Frequency: {} Hz", square.frequency());
    println!("  Duration: {} samples", total_samples);
    println!("  Frame size: {} samples", frame_size);
    println!();

    let mut frame_buffer = vec![0.0f64; frame_size];
    let mut frame_count = 0;

    loop {
        let state = square.process(&mut frame_buffer);
        frame_count += 1;

        let start_sample = (frame_count - 1) * frame_size;
        let preview: Vec<String> = frame_buffer
            .iter()
            .step_by(8)
            .map(|s| format!("{:+.0}", s))
            .collect();
        println!(
            "Frame {} (samples {}-{}): [{}] {:?}",
            frame_count,
            start_sample,
            (start_sample + frame_size).min(total_samples),
            preview.join(", "),
            state
        );

        if state == GeneratorState::Complete {
            break;
        }
    }

    println!("\nCompleted in {} frames", frame_count);
}

fn demo_tone() -> beeps::Result<()> {
    println!("\n=== Tone Synth Demo ===\n");

    let synth = ToneSynth::new(SynthConfig::default())?;
    let config = synth.config();
    println!("Configuration:");
    println!("  Volume: {}", config.volume);
    println!("  Sample rate: {} Hz", config.sample_rate);
    println!("  Fade: {} samples", config.fade_len);
    println!();

    for (token, duration) in [("A", 0.5), ("C5#", 0.25), ("G2b", 0.01)] {
        let note: NoteToken = token.parse()?;
        let samples = synth.render(note.frequency(), duration);
        let peak = samples.iter().fold(0.0f64, |acc, s| acc.max(s.abs()));
        println!(
            "{:<4} -> {:<5} {:>8.2} Hz, {}s: {} samples, peak {:.1}, edges [{:.1} .. {:.1}]",
            token,
            note.to_string(),
            note.frequency(),
            duration,
            samples.len(),
            peak,
            samples.first().copied().unwrap_or_default(),
            samples.last().copied().unwrap_or_default()
        );
    }
    Ok(())
}

fn demo_tempo() -> beeps::Result<()> {
    println!("\n=== Tempo Scale ===\n");

    let mixer = BarMixer::new(SynthConfig::default(), Balance::default())?;
    println!("{:<6} {:<10} {:<12}", "Tempo", "ms/beat", "Bar frames");
    println!("{}", "-".repeat(30));
    for tempo in [Tempo::Slow, Tempo::Medium, Tempo::Fast, Tempo::ExtraFast] {
        println!(
            "{:<6} {:<10} {:<12}",
            tempo.label(),
            tempo.sixteenth_ms(),
            mixer.bar_len(tempo.seconds_per_beat())
        );
    }
    Ok(())
}

fn main() -> beeps::Result<()> {
    println!("Beeps Square-Wave Player");
    println!("========================");

    demo_pitch_table()?;
    demo_square();
    demo_tone()?;
    demo_tempo()?;

    println!("\n========================");
    println!("All demos complete!");
    Ok(())
}
