//! ffi-navigator-core - Follow FFI registrations across the language boundary
//!
//! Core library for ffi-navigator: the source coordinate model, the located
//! facts that describe registrations and their use sites, a regex-driven
//! pattern toolkit that extracts those facts from one file at a time, and a
//! host-language import resolver.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use ffi_navigator_core::{split_lines, Fact, LineWindow, MacroMatcher};
//!
//! let source = "TVM_REGISTER_GLOBAL(\"relay.backend.lower\")\n.set_body(Lower);";
//! let lines = split_lines(source);
//! let matcher = MacroMatcher::new(&["TVM_REGISTER_GLOBAL"]).unwrap();
//!
//! let facts = matcher.find(&lines, LineWindow::all(), |hit| {
//!     Some(Fact::def(hit.key, Path::new("/src/lower.cc"), hit.range))
//! });
//! assert_eq!(facts[0].key(), Some("relay.backend.lower"));
//! ```

pub mod error;
pub mod facts;
pub mod pattern;
pub mod position;
pub mod resolver;

// Re-export main types and functions
pub use error::{PatternError, Result};
pub use facts::{Definition, Export, Fact, KeyMapping, Location, Reference, Symbol};
pub use pattern::{
    extract_symbol, find_py_imports, search_symbol, split_lines, CallSiteSearcher,
    DecoratorMatcher, KeyHit, LineWindow, MacroMatcher, MatchMode, MultiLineMatcher, PyImport,
    RegexMatcher,
};
pub use position::{Position, Range};
pub use resolver::{module_path, ImportResolver, ImportTarget, Resolved, MAX_RESOLVE_DEPTH};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
