//! Two-voice tunes: data model, bar layout and track assembly
//!
//! A tune is a melody and a harmony, each an ordered list of bars. A bar is
//! sixteen sixteenth-note beats long and holds steps of `{note, octave,
//! beats}`, where `note` is a pitch class id (0 = C ... 11 = B, -1 = rest)
//! and `octave` an octave id (0 = octave 2 ... 3 = octave 5).
//!
//! Tunes are stored as JSON:
//! ```json
//! { "tune": { "name": "...", "tempo": 1, "key": null,
//!             "melody":  [[{ "note": 0, "octave": 2, "beats": 4 }]],
//!             "harmony": [[{ "note": 7, "octave": 1, "beats": 4 }]] } }
//! ```

pub mod bar;
pub mod track;

pub use bar::{Balance, BarMixer, StereoBuffer};
pub use track::TrackAssembler;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BeepError, Result};
use crate::pitch::{Accidental, Letter, Note, NoteToken};

/// Sixteenth-note beats in one bar
pub const BEATS_PER_BAR: u32 = 16;

/// Pitch class id marking a rest
pub const REST: i32 = -1;

/// Tempo, stored in tune files as its numeric id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Tempo {
    /// 60 bpm (adagio)
    Slow,
    /// ~80 bpm (andante)
    Medium,
    /// 120 bpm (moderato)
    Fast,
    /// ~160 bpm (allegro)
    ExtraFast,
}

impl Tempo {
    /// Duration of one sixteenth note in milliseconds
    ///
    /// Medium and extra fast are rounded (187.5 and 93.75 ms exactly).
    pub fn sixteenth_ms(&self) -> u32 {
        match self {
            Tempo::Slow => 250,
            Tempo::Medium => 188,
            Tempo::Fast => 125,
            Tempo::ExtraFast => 94,
        }
    }

    pub fn seconds_per_beat(&self) -> f64 {
        self.sixteenth_ms() as f64 / 1000.0
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tempo::Slow => "SLW",
            Tempo::Medium => "MED",
            Tempo::Fast => "FST",
            Tempo::ExtraFast => "XFST",
        }
    }
}

impl TryFrom<u8> for Tempo {
    type Error = BeepError;

    fn try_from(id: u8) -> Result<Self> {
        match id {
            0 => Ok(Tempo::Slow),
            1 => Ok(Tempo::Medium),
            2 => Ok(Tempo::Fast),
            3 => Ok(Tempo::ExtraFast),
            _ => Err(BeepError::UnknownTempo(id)),
        }
    }
}

impl From<Tempo> for u8 {
    fn from(tempo: Tempo) -> u8 {
        match tempo {
            Tempo::Slow => 0,
            Tempo::Medium => 1,
            Tempo::Fast => 2,
            Tempo::ExtraFast => 3,
        }
    }
}

/// One timed note of a bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub note: i32,
    pub octave: i32,
    pub beats: u32,
}

impl Step {
    pub fn is_rest(&self) -> bool {
        self.note == REST
    }

    /// Resolve the pitch class and octave ids into a playable note
    pub fn note(&self) -> Result<Note> {
        if self.is_rest() {
            return Ok(Note::Pause);
        }
        let (letter, accidental) = pitch_class(self.note)?;
        let token = NoteToken::new(letter, octave(self.octave)?, accidental)?;
        Ok(Note::Pitched(token))
    }
}

/// Reverse lookup of a pitch class id
fn pitch_class(id: i32) -> Result<(Letter, Option<Accidental>)> {
    let sharp = Some(Accidental::Sharp);
    match id {
        0 => Ok((Letter::C, None)),
        1 => Ok((Letter::C, sharp)),
        2 => Ok((Letter::D, None)),
        3 => Ok((Letter::D, sharp)),
        4 => Ok((Letter::E, None)),
        5 => Ok((Letter::F, None)),
        6 => Ok((Letter::F, sharp)),
        7 => Ok((Letter::G, None)),
        8 => Ok((Letter::G, sharp)),
        9 => Ok((Letter::A, None)),
        10 => Ok((Letter::A, sharp)),
        11 => Ok((Letter::B, None)),
        _ => Err(BeepError::UnknownPitchClass(id)),
    }
}

/// Reverse lookup of an octave id; id 2 is the middle C octave
fn octave(id: i32) -> Result<u8> {
    match id {
        0..=3 => Ok(id as u8 + 2),
        _ => Err(BeepError::UnknownOctave(id)),
    }
}

pub type Bar = Vec<Step>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tune {
    pub name: String,
    pub tempo: Tempo,
    /// Key metadata, carried along but not interpreted
    #[serde(default)]
    pub key: serde_json::Value,
    pub melody: Vec<Bar>,
    #[serde(default)]
    pub harmony: Vec<Bar>,
}

impl Tune {
    /// Check that every sounding step resolves to a note
    pub fn validate(&self) -> Result<()> {
        for step in self.melody.iter().chain(&self.harmony).flatten() {
            if step.beats > 0 {
                step.note()?;
            }
        }
        Ok(())
    }

    /// Number of bars that make it into a track (melody and harmony are paired)
    pub fn bar_count(&self) -> usize {
        self.melody.len().min(self.harmony.len())
    }
}

/// On-disk envelope around a tune
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongFile {
    pub tune: Tune,
}

pub fn parse_tune(json: &str) -> Result<Tune> {
    let song: SongFile = serde_json::from_str(json)?;
    Ok(song.tune)
}

pub fn load_tune(path: impl AsRef<Path>) -> Result<Tune> {
    parse_tune(&fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SONG: &str = r#"{
        "tune": {
            "name": "Two Bars",
            "tempo": 2,
            "key": null,
            "melody": [
                [{ "note": 0, "octave": 2, "beats": 8 }, { "note": 4, "octave": 2, "beats": 8 }],
                [{ "note": 10, "octave": 3, "beats": 16 }]
            ],
            "harmony": [
                [{ "note": -1, "octave": -1, "beats": 0 }],
                [{ "note": 7, "octave": 0, "beats": 4 }]
            ]
        }
    }"#;

    #[test]
    fn test_parse_tune() {
        let tune = parse_tune(SONG).unwrap();
        assert_eq!(tune.name, "Two Bars");
        assert_eq!(tune.tempo, Tempo::Fast);
        assert_eq!(tune.melody.len(), 2);
        assert_eq!(tune.harmony.len(), 2);
        assert_eq!(tune.melody[0][1], Step { note: 4, octave: 2, beats: 8 });
        assert!(tune.validate().is_ok());
        assert_eq!(tune.bar_count(), 2);
    }

    #[test]
    fn test_unknown_tempo() {
        let json = SONG.replace("\"tempo\": 2", "\"tempo\": 7");
        let err = parse_tune(&json).unwrap_err();
        assert!(matches!(err, BeepError::Json(_)));
        assert!(err.to_string().contains("Unknown tempo id: 7"));
    }

    #[test]
    fn test_tempo_scale() {
        assert_eq!(Tempo::Slow.seconds_per_beat(), 0.25);
        assert_eq!(Tempo::Medium.seconds_per_beat(), 0.188);
        assert_eq!(Tempo::Fast.seconds_per_beat(), 0.125);
        assert_eq!(Tempo::ExtraFast.seconds_per_beat(), 0.094);
        for id in 0..4u8 {
            let tempo = Tempo::try_from(id).unwrap();
            assert_eq!(u8::from(tempo), id);
        }
        assert_eq!(Tempo::ExtraFast.label(), "XFST");
    }

    #[test]
    fn test_step_note_lookup() {
        let step = Step { note: 0, octave: 2, beats: 4 };
        assert_eq!(step.note().unwrap().to_string(), "C4");

        let step = Step { note: 10, octave: 3, beats: 4 };
        assert_eq!(step.note().unwrap().to_string(), "A5#");

        let step = Step { note: 11, octave: 0, beats: 1 };
        assert_eq!(step.note().unwrap().to_string(), "B2");

        let rest = Step { note: REST, octave: -1, beats: 2 };
        assert_eq!(rest.note().unwrap(), Note::Pause);
    }

    #[test]
    fn test_step_unknown_ids() {
        let step = Step { note: 12, octave: 2, beats: 4 };
        assert!(matches!(step.note(), Err(BeepError::UnknownPitchClass(12))));

        let step = Step { note: 3, octave: 4, beats: 4 };
        assert!(matches!(step.note(), Err(BeepError::UnknownOctave(4))));

        let step = Step { note: 3, octave: -1, beats: 4 };
        assert!(matches!(step.note(), Err(BeepError::UnknownOctave(-1))));
    }

    #[test]
    fn test_validate_skips_silent_steps() {
        let mut tune = parse_tune(SONG).unwrap();
        // Zero-beat steps never sound, so their ids are not checked
        tune.harmony[0].push(Step { note: 99, octave: 9, beats: 0 });
        assert!(tune.validate().is_ok());

        tune.melody[1].push(Step { note: 99, octave: 2, beats: 1 });
        assert!(matches!(tune.validate(), Err(BeepError::UnknownPitchClass(99))));
    }
}
