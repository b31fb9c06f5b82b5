//! Dialect Provider Trait
//!
//! Defines the contract between the workspace and a framework's FFI
//! convention. Each dialect wraps the pattern toolkit with its own macro
//! names, decorators and file-type rules.

use std::path::{Path, PathBuf};

use ffi_navigator_core::{Fact, ImportResolver, LineWindow, Position};

/// The contract every dialect provider implements.
///
/// The workspace calls [`init_pass`](Self::init_pass) on every file before
/// it calls [`extract`](Self::extract) on any of them, so a provider can
/// record package roots first and validate decorators against the complete
/// import graph later.
pub trait DialectProvider: Send + Sync {
    /// Unique identifier for this dialect (e.g., "tvm", "torch")
    fn name(&self) -> &str;

    /// Inspect a file before extraction, typically to register package roots.
    fn init_pass(&mut self, _path: &Path, _lines: &[&str], _resolver: &mut ImportResolver) {}

    /// Facts found in `lines[window]` of the file at `path`.
    fn extract(
        &self,
        path: &Path,
        lines: &[&str],
        window: LineWindow,
        resolver: &ImportResolver,
    ) -> Vec<Fact>;

    /// The definition or reference under the cursor, if any.
    ///
    /// Only the lines around `pos` are scanned.
    fn extract_symbol(
        &self,
        path: &Path,
        lines: &[&str],
        pos: Position,
        resolver: &ImportResolver,
    ) -> Option<Fact> {
        let facts = self.extract(path, lines, LineWindow::around(pos.line), resolver);
        first_touching(facts, pos)
    }

    /// Directories to scan besides the configured defaults.
    fn additional_scan_dirs(&self, _root: &Path) -> Vec<PathBuf> {
        Vec::new()
    }
}

/// First definition or reference whose range touches `pos`
pub fn first_touching(facts: Vec<Fact>, pos: Position) -> Option<Fact> {
    facts.into_iter().find(|fact| match fact {
        Fact::Definition(def) => def.range.touches(pos),
        Fact::Reference(reference) => reference.range.touches(pos),
        Fact::Export(_) | Fact::Symbol(_) => false,
    })
}

/// Coarse file classification used to route a file to a dialect's matchers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// `.py`
    Python,
    /// `.h`, `.cc`, `.cpp`
    Native,
    /// Anything else
    Other,
}

impl SourceKind {
    pub fn of(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("py") => SourceKind::Python,
            Some("h" | "cc" | "cpp") => SourceKind::Native,
            _ => SourceKind::Other,
        }
    }
}

/// `<dir>` when `path` is `.../<marker>/__init__.py`.
///
/// `marker` may have several components, e.g. `python/tvm`.
pub fn package_root_of_init(path: &Path, marker: &str) -> Option<PathBuf> {
    if !path.ends_with(Path::new(marker).join("__init__.py")) {
        return None;
    }
    path.parent().map(Path::to_path_buf)
}
