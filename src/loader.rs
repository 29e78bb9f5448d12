//! Hex program loader
//!
//! Reads the simulator's program format: ASCII text, one 32-bit
//! instruction per non-blank line as exactly eight hex digits, earlier
//! lines at lower addresses. Blank and whitespace-only lines are skipped;
//! anything else is a parse error naming the line.

use std::path::Path;

use crate::bits::{self, Bit};
use crate::error::{HexError, SimulatorResult};

/// Parse hex program text into instruction words.
pub fn parse_hex_text(text: &str) -> Result<Vec<Vec<Bit>>, HexError> {
    let mut words = Vec::new();

    for (index, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if line.len() != 8 {
            return Err(HexError::BadLineLength {
                line: index + 1,
                text: line.to_string(),
            });
        }

        let word = bits::from_hex(line).map_err(|e| match e {
            HexError::BadDigit { digit, text } => {
                HexError::BadLineDigit { line: index + 1, digit, text }
            }
            other => other,
        })?;
        words.push(word);
    }

    Ok(words)
}

/// Load a .hex program file into instruction words.
pub fn load_hex_file(path: impl AsRef<Path>) -> SimulatorResult<Vec<Vec<Bit>>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| HexError::FileReadError(path.to_path_buf(), e))?;

    let words = parse_hex_text(&text)?;
    if words.is_empty() {
        return Err(HexError::EmptyFile(path.to_path_buf()).into());
    }
    Ok(words)
}
