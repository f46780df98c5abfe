//! Error types for relex

use thiserror::Error;

/// Result type alias for relex operations
pub type Result<T> = std::result::Result<T, RelexError>;

/// Errors raised outside the lexers themselves
///
/// Lexing never fails: malformed input is reported through
/// [`Format::Error`](crate::syntax::Format::Error) spans instead.
#[derive(Error, Debug)]
pub enum RelexError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    #[error("Unknown color: {0}")]
    UnknownColor(String),

    #[error("No such line: {0}")]
    LineOutOfRange(usize),

    #[error("{0}")]
    Message(String),
}
