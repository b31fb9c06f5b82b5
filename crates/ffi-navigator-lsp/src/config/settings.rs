//! Configuration Settings
//!
//! Defines the configuration structures read from `ffi-navigator.toml`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{NavigatorError, Result};

/// Name of the configuration file looked up in the workspace root
pub const CONFIG_FILE_NAME: &str = "ffi-navigator.toml";

/// Top-level settings structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Scan settings
    pub workspace: WorkspaceSettings,
    /// Dialect selection
    pub dialects: DialectSettings,
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Load `ffi-navigator.toml` from `root`.
    ///
    /// A missing file yields the defaults; a file that exists but cannot be
    /// read or parsed is an error.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            debug!("No {} in {}, using defaults", CONFIG_FILE_NAME, root.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path).map_err(|source| NavigatorError::ConfigIo {
            path: path.clone(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| NavigatorError::ConfigParse { path, source })
    }
}

/// Which directories and files are scanned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceSettings {
    /// Directories relative to the root, scanned recursively
    pub scan_dirs: Vec<String>,
    /// File extensions to index, without the dot
    pub extensions: Vec<String>,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            scan_dirs: vec![
                "src".to_string(),
                "include".to_string(),
                "python".to_string(),
            ],
            extensions: vec![
                "py".to_string(),
                "h".to_string(),
                "cc".to_string(),
                "cpp".to_string(),
            ],
        }
    }
}

/// Dialect selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DialectSettings {
    /// Dialect names to use instead of auto-detection
    pub enabled: Vec<String>,
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_default_scan_dirs() {
        let settings = Settings::default();
        assert_eq!(settings.workspace.scan_dirs, vec!["src", "include", "python"]);
        assert!(settings.dialects.enabled.is_empty());
    }

    #[test]
    fn test_settings_debug() {
        let settings = Settings::default();
        let debug_str = format!("{:?}", settings);
        assert!(debug_str.contains("Settings"));
    }
}
