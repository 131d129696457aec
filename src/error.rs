use thiserror::Error;

/// Unified crate-level error type
///
/// All errors in the crate should use this enum with `thiserror` for proper error propagation.
/// No-op outcomes (nothing to generate, no readings found) and malformed bracket text are
/// deliberately not errors; an unbalanced bracket simply fails to match and stays literal.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Reading generator failed: {message}")]
    Generator { message: String },

    #[error("Placeholder token {token:?} was corrupted by the reading generator")]
    PlaceholderCorrupted { token: String },

    #[error("Config error: {message}")]
    Config { message: String },
}

impl Error {
    /// Get actionable advice for this error
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Io(_) => "Check file permissions and that stdin is connected",
            Self::Json(_) => "Check the input JSON shape: {\"before\", \"selected\", \"after\"}",
            Self::Generator { .. } => {
                "Check that the reading generator command is installed and on PATH"
            }
            Self::PlaceholderCorrupted { .. } => {
                "The generator must pass shielded tokens through unchanged; the fragment was left untouched"
            }
            Self::Config { .. } => "Fix configuration file syntax or values",
        }
    }
}

/// Crate-level Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;
