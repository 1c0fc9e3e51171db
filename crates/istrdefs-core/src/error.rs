//! Error types for istrdefs

use thiserror::Error;

/// istrdefs error type
#[derive(Error, Debug)]
pub enum Error {
    /// The underlying error is the source, not part of the message
    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("Preprocessor error: {0}")]
    Preprocess(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Header tool error: {0}")]
    HeaderTool(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error was raised before any work began
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

/// Result type alias for istrdefs
pub type Result<T> = std::result::Result<T, Error>;
