//! ffi-navigator Language Server Protocol implementation
//!
//! This library indexes a mixed Python/C++ source tree and answers
//! go-to-definition and find-references across FFI registrations:
//! - Dialect providers for TVM, DGL, MXNet, PyTorch and Taichi conventions
//! - Automatic dialect detection, overridable in `ffi-navigator.toml`
//! - A workspace index with lazy reload on file changes
//! - A thin tower-lsp server exposing definition and references
//!
//! # Library Usage
//!
//! ```ignore
//! use ffi_navigator_lsp::Workspace;
//!
//! let ws = Workspace::new();
//! ws.initialize(Path::new("/path/to/tvm"))?;
//! let defs = ws.find_defs(Path::new("/path/to/tvm/python/tvm/relay/expr.py"), "_make.Let");
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # Start the language server (typically called by an editor)
//! ffi-navigator-lsp
//!
//! # With debug logging
//! RUST_LOG=debug ffi-navigator-lsp
//! ```

pub mod config;
pub mod dialect;
pub mod error;
pub mod server;
pub mod workspace;

// Re-export main entry point
pub use server::run_server;

// Re-export commonly used types
pub use config::Settings;
pub use dialect::{DialectKind, DialectProvider, DialectRegistry};
pub use error::{NavigatorError, Result};
pub use workspace::{dedup_locations, Workspace, WorkspaceStats};
