//! Core error types for the PEAQ engine
use thiserror::Error;

/// Result type alias using `PeaqError`
pub type Result<T> = std::result::Result<T, PeaqError>;

/// Errors raised while setting up an evaluation
///
/// Per-frame calculations never fail; everything here happens at construction
/// or configuration time.
#[derive(Error, Debug)]
pub enum PeaqError {
    /// Channel count outside the supported range
    #[error("Invalid channel count: {0} (must be at least 1)")]
    InvalidChannelCount(usize),

    /// Band count that does not fit the critical band layout
    #[error("Invalid band count: {0}")]
    InvalidBandCount(usize),

    /// Two tables that must be parallel have different lengths
    #[error("Length mismatch for {what}: expected {expected}, got {actual}")]
    LengthMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    /// I/O errors while reading settings
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// TOML parse errors
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl PeaqError {
    /// Create a length mismatch error
    pub fn length_mismatch(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::LengthMismatch {
            what: what.into(),
            expected,
            actual,
        }
    }
}
