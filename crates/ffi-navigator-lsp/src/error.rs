//! Error types for the navigator.

use std::path::PathBuf;

use ffi_navigator_core::PatternError;
use thiserror::Error;

/// Result type for workspace and configuration operations
pub type Result<T> = std::result::Result<T, NavigatorError>;

/// Errors that can occur while setting up a workspace
#[derive(Error, Debug)]
pub enum NavigatorError {
    /// Configuration file could not be read
    #[error("Cannot read configuration {}: {source}", .path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for the settings schema
    #[error("Invalid configuration {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A dialect named in the configuration does not exist
    #[error("Unknown dialect '{name}' (expected one of: {known})")]
    UnknownDialect { name: String, known: String },

    /// Scan directory or extension produced an invalid glob
    #[error("Invalid scan pattern: {0}")]
    Glob(#[from] glob::PatternError),

    /// A dialect matcher failed to compile
    #[error("Pattern error: {0}")]
    Pattern(#[from] PatternError),

    /// The workspace root is missing or not a directory
    #[error("Workspace root {} is not a directory", .0.display())]
    InvalidRoot(PathBuf),
}
