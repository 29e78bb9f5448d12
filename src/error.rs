use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the simulator
#[derive(Error, Debug)]
pub enum SimulatorError {
    #[error("Failed to load hex program: {0}")]
    HexLoadError(#[from] HexError),

    #[error("Memory error: {0}")]
    MemoryError(#[from] MemoryError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

/// Errors related to hex program files and hex text
#[derive(Error, Debug)]
pub enum HexError {
    #[error("Failed to read hex file '{0}': {1}")]
    FileReadError(PathBuf, #[source] std::io::Error),

    #[error("Hex file '{0}' contains no instructions")]
    EmptyFile(PathBuf),

    #[error("Line {line}: expected 8 hex digits, got '{text}'")]
    BadLineLength { line: usize, text: String },

    #[error("Line {line}: invalid hex digit '{digit}' in '{text}'")]
    BadLineDigit { line: usize, digit: char, text: String },

    #[error("Hex string '{text}' has odd length")]
    OddLength { text: String },

    #[error("Invalid hex digit '{digit}' in '{text}'")]
    BadDigit { digit: char, text: String },
}

/// Errors related to memory operations
#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Address 0x{addr} out of bounds")]
    OutOfBounds { addr: String },

    #[error("Address 0x{addr} is not word-aligned")]
    Misaligned { addr: String },

    #[error("Program of {words} words does not fit the instruction region")]
    ProgramTooLarge { words: usize },
}

/// Type alias for Result with SimulatorError
pub type SimulatorResult<T> = Result<T, SimulatorError>;
