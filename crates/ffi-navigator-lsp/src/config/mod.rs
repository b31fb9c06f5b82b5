//! Configuration Engine
//!
//! Optional per-project settings for ffi-navigator.
//!
//! # Configuration File
//!
//! Settings are loaded from `ffi-navigator.toml` in the workspace root:
//!
//! ```toml
//! [workspace]
//! scan_dirs = ["src", "include", "python"]
//! extensions = ["py", "h", "cc", "cpp"]
//!
//! [dialects]
//! enabled = ["tvm"]
//! ```
//!
//! Every section is optional. An empty `dialects.enabled` list means the
//! dialects are detected from the repository layout.

mod settings;

#[cfg(test)]
mod tests;

pub use settings::{DialectSettings, Settings, WorkspaceSettings, CONFIG_FILE_NAME};
