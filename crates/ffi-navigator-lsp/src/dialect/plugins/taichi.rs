//! Taichi Plugin
//!
//! Taichi binds its C++ core with pybind11 (`m.def("name", ...)`,
//! `py::class_<T>(m, "Name")`) and Python reaches the bindings through a
//! `core` module alias such as `ti.core.expr_add` or `taichi_lang_core`.

use std::path::{Path, PathBuf};

use ffi_navigator_core::{
    Fact, ImportResolver, LineWindow, MatchMode, MultiLineMatcher, Range, RegexMatcher,
};
use tracing::info;

use crate::dialect::traits::{package_root_of_init, DialectProvider, SourceKind};
use crate::error::Result;

const PYBIND_CLASS_PATTERN: &str = concat!(
    r"py::class_<[A-Za-z0-9_:<>]+(,\s*[A-Za-z0-9_:<>]+)*>",
    r#"\s*\(\s*m,\s*"(?P<key>[A-Za-z0-9_]+)""#,
    r"(,\s*[A-Za-z0-9_:<>()]+)*\)",
);

/// Provider for the Taichi code base
#[derive(Debug, Clone)]
pub struct TaichiProvider {
    cpp_pybind_func: MultiLineMatcher,
    cpp_pybind_class: MultiLineMatcher,
    py_core: RegexMatcher,
}

impl TaichiProvider {
    pub fn new() -> Result<Self> {
        Ok(Self {
            cpp_pybind_func: MultiLineMatcher::new(r#"\.def\(\s*"(?P<key>[a-z0-9_]+)""#)?,
            cpp_pybind_class: MultiLineMatcher::new(PYBIND_CLASS_PATTERN)?,
            py_core: RegexMatcher::new(
                r"[._]?core\.(?P<key>[A-Za-z0-9_]+)",
                MatchMode::Search,
            )?,
        })
    }
}

impl DialectProvider for TaichiProvider {
    fn name(&self) -> &str {
        "taichi"
    }

    fn init_pass(&mut self, path: &Path, _lines: &[&str], resolver: &mut ImportResolver) {
        if let Some(root) = package_root_of_init(path, "taichi") {
            info!("taichi: found python path {}", root.display());
            resolver.add_package("taichi", &root);
        }
    }

    fn extract(
        &self,
        path: &Path,
        lines: &[&str],
        window: LineWindow,
        _resolver: &ImportResolver,
    ) -> Vec<Fact> {
        match SourceKind::of(path) {
            // Bindings may span lines, so the whole file is always searched
            SourceKind::Native => {
                let create = |caps: &regex::Captures<'_>, range: Range| {
                    Some(Fact::def(&caps["key"], path, range))
                };
                let mut facts = self.cpp_pybind_func.find(lines, create);
                facts.extend(self.cpp_pybind_class.find(lines, create));
                facts
            }
            SourceKind::Python => self.py_core.find(lines, window, |caps, range| {
                Some(Fact::reference(&caps["key"], path, range))
            }),
            SourceKind::Other => Vec::new(),
        }
    }

    fn additional_scan_dirs(&self, root: &Path) -> Vec<PathBuf> {
        vec![root.join("taichi")]
    }
}
