//! ffi-navigator CLI - Command-line interface library
//!
//! This library provides the CLI functionality for ffi-navigator:
//! - Index: Scan a source tree and report what was found
//! - Defs: Definitions of a Python expression
//! - Refs: References to a registry key
//! - Lookup: Resolve whatever sits at a cursor position
//!
//! # Library Usage
//!
//! ```ignore
//! use ffi_navigator_cli::{refs_command, OutputFormat};
//!
//! // Run the full CLI
//! run_cli();
//!
//! // Or use individual commands programmatically
//! refs_command(&root, "relay._make.Let", OutputFormat::Json, &mut std::io::stdout())?;
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # Index statistics
//! ffi-navigator index ~/src/tvm
//!
//! # Where is `_make.Let` registered?
//! ffi-navigator defs ~/src/tvm python/tvm/relay/expr.py _make.Let
//!
//! # Who uses a key, as JSON
//! ffi-navigator refs ~/src/tvm relay._make.Let --format json
//! ```

pub mod app;

// Re-export main entry point and types
pub use app::{
    defs_command, index_command, lookup_command, open_workspace, refs_command, run_cli,
    OutputFormat,
};
