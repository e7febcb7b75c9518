//! Note token parsing and pitch resolution
//!
//! Token format: `<letter>[<octave>][<accidental>]`
//!
//! - Letters: A-G (case-insensitive)
//! - Octaves: 0-8, default 4
//! - Accidentals: `#` (sharp) or `b` (flat)
//!
//! With no octave the accidental directly follows the letter (`A#`, `Eb`).
//! The literal `pause` stands for silence and never reaches the resolver.

use std::fmt;
use std::str::FromStr;

use crate::error::{BeepError, Result};

/// Octave applied when the token does not name one
pub const DEFAULT_OCTAVE: u8 = 4;

/// Highest octave a token may name
pub const MAX_OCTAVE: u8 = 8;

/// Reserved token for silence
pub const PAUSE: &str = "pause";

/// Frequency ratio between two adjacent equal-tempered semitones
pub fn semitone_ratio() -> f64 {
    2f64.powf(1.0 / 12.0)
}

/// Note letter (natural pitch)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Letter {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

impl Letter {
    pub const ALL: [Letter; 7] = [
        Letter::C,
        Letter::D,
        Letter::E,
        Letter::F,
        Letter::G,
        Letter::A,
        Letter::B,
    ];

    /// Frequency of this letter in octave 0, in Hz
    pub fn base_frequency(&self) -> f64 {
        match self {
            Letter::A => 27.5,
            Letter::B => 30.86771,
            Letter::C => 16.3516,
            Letter::D => 18.35405,
            Letter::E => 20.60172,
            Letter::F => 21.82676,
            Letter::G => 24.49971,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Letter::A => 'A',
            Letter::B => 'B',
            Letter::C => 'C',
            Letter::D => 'D',
            Letter::E => 'E',
            Letter::F => 'F',
            Letter::G => 'G',
        }
    }
}

impl TryFrom<char> for Letter {
    type Error = BeepError;

    fn try_from(c: char) -> Result<Self> {
        match c.to_ascii_uppercase() {
            'A' => Ok(Letter::A),
            'B' => Ok(Letter::B),
            'C' => Ok(Letter::C),
            'D' => Ok(Letter::D),
            'E' => Ok(Letter::E),
            'F' => Ok(Letter::F),
            'G' => Ok(Letter::G),
            _ => Err(BeepError::InvalidNote(c.to_string())),
        }
    }
}

/// Semitone shift applied after the octave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accidental {
    Sharp,
    Flat,
}

impl Accidental {
    pub fn symbol(&self) -> char {
        match self {
            Accidental::Sharp => '#',
            Accidental::Flat => 'b',
        }
    }

    /// Shift a frequency by one semitone in this accidental's direction
    pub fn apply(&self, freq: f64) -> f64 {
        match self {
            Accidental::Sharp => freq * semitone_ratio(),
            Accidental::Flat => freq / semitone_ratio(),
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c {
            '#' => Some(Accidental::Sharp),
            'b' => Some(Accidental::Flat),
            _ => None,
        }
    }
}

/// A parsed, validated note token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteToken {
    pub letter: Letter,
    pub octave: u8,
    pub accidental: Option<Accidental>,
}

impl NoteToken {
    pub fn new(letter: Letter, octave: u8, accidental: Option<Accidental>) -> Result<Self> {
        if octave > MAX_OCTAVE {
            return Err(BeepError::InvalidOctave(octave.to_string()));
        }
        Ok(Self {
            letter,
            octave,
            accidental,
        })
    }

    /// Fundamental frequency in Hz
    ///
    /// base(letter) * 2^octave, then one semitone up or down for the accidental.
    pub fn frequency(&self) -> f64 {
        let freq = self.letter.base_frequency() * 2f64.powi(self.octave as i32);
        match self.accidental {
            Some(accidental) => accidental.apply(freq),
            None => freq,
        }
    }
}

fn parse_octave(c: char) -> Result<u8> {
    match c.to_digit(10) {
        Some(d) if d <= MAX_OCTAVE as u32 => Ok(d as u8),
        _ => Err(BeepError::InvalidOctave(c.to_string())),
    }
}

impl FromStr for NoteToken {
    type Err = BeepError;

    fn from_str(s: &str) -> Result<Self> {
        let chars: Vec<char> = s.chars().collect();

        let letter = match chars.first() {
            Some(&c) => Letter::try_from(c)?,
            None => return Err(BeepError::InvalidNote(s.to_string())),
        };

        let (octave, accidental) = match chars.len() {
            1 => (DEFAULT_OCTAVE, None),
            // A digit is an octave; anything else must be an accidental
            2 if chars[1].is_ascii_digit() => (parse_octave(chars[1])?, None),
            2 => {
                let accidental = Accidental::from_char(chars[1])
                    .ok_or_else(|| BeepError::InvalidAccidental(chars[1].to_string()))?;
                (DEFAULT_OCTAVE, Some(accidental))
            }
            3 => {
                let octave = parse_octave(chars[1])?;
                let accidental = Accidental::from_char(chars[2])
                    .ok_or_else(|| BeepError::InvalidAccidental(chars[2].to_string()))?;
                (octave, Some(accidental))
            }
            _ => return Err(BeepError::InvalidNote(s.to_string())),
        };

        Ok(NoteToken {
            letter,
            octave,
            accidental,
        })
    }
}

/// Canonical `<letter><octave>[<accidental>]` form, which parses back to the same token
impl fmt::Display for NoteToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.letter.as_char(), self.octave)?;
        if let Some(accidental) = self.accidental {
            write!(f, "{}", accidental.symbol())?;
        }
        Ok(())
    }
}

/// Anything that can be played: a pitched note or a pause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Note {
    Pause,
    Pitched(NoteToken),
}

impl Note {
    /// Frequency in Hz, `None` for a pause
    pub fn frequency(&self) -> Option<f64> {
        match self {
            Note::Pause => None,
            Note::Pitched(token) => Some(token.frequency()),
        }
    }
}

impl FromStr for Note {
    type Err = BeepError;

    fn from_str(s: &str) -> Result<Self> {
        if s == PAUSE {
            Ok(Note::Pause)
        } else {
            Ok(Note::Pitched(s.parse()?))
        }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Note::Pause => f.write_str(PAUSE),
            Note::Pitched(token) => token.fmt(f),
        }
    }
}

/// Resolve a note token to its fundamental frequency in Hz
///
/// # Example
/// ```
/// use beeps::pitch::resolve;
///
/// assert!((resolve("A").unwrap() - 440.0).abs() < 1e-9);
/// assert!(resolve("H").is_err());
/// ```
pub fn resolve(token: &str) -> Result<f64> {
    Ok(token.parse::<NoteToken>()?.frequency())
}
