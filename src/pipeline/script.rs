//! Parser for note scripts
//!
//! Format, one note per line:
//! <note>:<seconds>   # e.g. A4:0.5, C#:0.25, pause:1
//!
//! Blank lines and lines starting with `#` are skipped.

use std::fs;
use std::path::Path;

use crate::error::{BeepError, Result};
use crate::pitch::Note;

/// One line of a script: what to play and for how long
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptStep {
    pub note: Note,
    pub duration: f64,
}

fn script_error(line: usize, message: impl Into<String>) -> BeepError {
    BeepError::Script {
        line,
        message: message.into(),
    }
}

/// Parse a single `note:duration` line
///
/// `line_no` is only used for error reporting.
pub fn parse_line(line: &str, line_no: usize) -> Result<ScriptStep> {
    let (note_part, duration_part) = line
        .split_once(':')
        .ok_or_else(|| script_error(line_no, "expected format: <note>:<seconds>"))?;

    let duration_part = duration_part.trim();
    let duration = duration_part
        .parse::<f64>()
        .map_err(|_| script_error(line_no, format!("invalid duration '{}'", duration_part)))?;
    if !duration.is_finite() || duration <= 0.0 {
        return Err(script_error(
            line_no,
            format!("duration must be positive, got {}", duration_part),
        ));
    }

    let note = note_part.trim().parse::<Note>()?;
    Ok(ScriptStep { note, duration })
}

/// Parse a full script, in order
pub fn parse_script(text: &str) -> Result<Vec<ScriptStep>> {
    let mut steps = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        steps.push(parse_line(line, index + 1)?);
    }

    Ok(steps)
}

pub fn load_script(path: impl AsRef<Path>) -> Result<Vec<ScriptStep>> {
    parse_script(&fs::read_to_string(path)?)
}

/// Total running time of a script in seconds
pub fn total_duration(steps: &[ScriptStep]) -> f64 {
    steps.iter().map(|step| step.duration).sum()
}
