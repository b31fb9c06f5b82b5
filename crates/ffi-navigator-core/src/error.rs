//! Error types for the pattern toolkit.

use thiserror::Error;

/// Result type for matcher construction
pub type Result<T> = std::result::Result<T, PatternError>;

/// Errors raised while building a matcher
#[derive(Debug, Error)]
pub enum PatternError {
    /// The regular expression did not compile
    #[error("Invalid pattern `{pattern}`: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A matcher was given no names to match
    #[error("Matcher needs at least one name")]
    NoNames,
}

impl PatternError {
    pub(crate) fn invalid(pattern: &str, source: regex::Error) -> Self {
        PatternError::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        }
    }
}
