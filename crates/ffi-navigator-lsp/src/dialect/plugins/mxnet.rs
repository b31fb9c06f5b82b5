//! MXNet Plugin
//!
//! MXNet exposes a flat C API (`int MXNDArrayCreate(...)`) that Python
//! calls through ctypes as `_LIB.MXNDArrayCreate`.

use std::path::Path;

use ffi_navigator_core::{Fact, ImportResolver, LineWindow, MatchMode, Position, RegexMatcher};
use tracing::info;

use crate::dialect::traits::{first_touching, package_root_of_init, DialectProvider, SourceKind};
use crate::error::Result;

/// Provider for the MXNet code base
#[derive(Debug, Clone)]
pub struct MxnetProvider {
    cc_c_api: RegexMatcher,
    py_lib: RegexMatcher,
}

impl MxnetProvider {
    pub fn new() -> Result<Self> {
        Ok(Self {
            cc_c_api: RegexMatcher::new(r"\s*int\s*(?P<key>MX[A-Za-z0-9]+)", MatchMode::Anchored)?,
            py_lib: RegexMatcher::new(r".*_LIB\.(?P<key>MX[A-Za-z0-9]+)", MatchMode::Anchored)?,
        })
    }

    fn extract_python(&self, path: &Path, lines: &[&str], window: LineWindow) -> Vec<Fact> {
        self.py_lib.find(lines, window, |caps, range| {
            Some(Fact::reference(&caps["key"], path, range))
        })
    }
}

impl DialectProvider for MxnetProvider {
    fn name(&self) -> &str {
        "mxnet"
    }

    fn init_pass(&mut self, path: &Path, _lines: &[&str], resolver: &mut ImportResolver) {
        if let Some(root) = package_root_of_init(path, "python/mxnet") {
            info!("mxnet: found python path {}", root.display());
            resolver.add_package("mxnet", &root);
        }
    }

    fn extract(
        &self,
        path: &Path,
        lines: &[&str],
        window: LineWindow,
        _resolver: &ImportResolver,
    ) -> Vec<Fact> {
        let in_c_api = path.to_string_lossy().contains("c_api");
        if SourceKind::of(path) != SourceKind::Native || !in_c_api {
            return Vec::new();
        }
        self.cc_c_api.find(lines, window, |caps, range| {
            Some(Fact::def(&caps["key"], path, range))
        })
    }

    /// `_LIB.MX*` uses are resolved at the cursor only, never indexed
    fn extract_symbol(
        &self,
        path: &Path,
        lines: &[&str],
        pos: Position,
        _resolver: &ImportResolver,
    ) -> Option<Fact> {
        if SourceKind::of(path) != SourceKind::Python {
            return None;
        }
        let facts = self.extract_python(path, lines, LineWindow::around(pos.line));
        first_touching(facts, pos)
    }
}
