//! DGL Plugin
//!
//! DGL vendors TVM's packed-function runtime under its own `DGL_` macro
//! names and the `dgl` Python package.

use std::path::Path;

use ffi_navigator_core::{Fact, ImportResolver, LineWindow};

use super::packed::PackedFuncCore;
use crate::dialect::traits::{DialectProvider, SourceKind};
use crate::error::Result;

/// Provider for the DGL code base
#[derive(Debug, Clone)]
pub struct DglProvider {
    core: PackedFuncCore,
}

impl DglProvider {
    pub fn new() -> Result<Self> {
        Ok(Self {
            core: PackedFuncCore::new(
                "dgl",
                &["DGL_REGISTER_API", "DGL_REGISTER_GLOBAL"],
                &["register_object"],
            )?,
        })
    }
}

impl DialectProvider for DglProvider {
    fn name(&self) -> &str {
        "dgl"
    }

    fn init_pass(&mut self, path: &Path, _lines: &[&str], resolver: &mut ImportResolver) {
        self.core.init_pass(path, resolver);
    }

    fn extract(
        &self,
        path: &Path,
        lines: &[&str],
        window: LineWindow,
        resolver: &ImportResolver,
    ) -> Vec<Fact> {
        match SourceKind::of(path) {
            SourceKind::Native => self.core.extract_native(path, lines, window),
            SourceKind::Python => {
                self.core
                    .extract_python(path, lines, window, resolver, |key, _| format!("t:{}", key))
            }
            SourceKind::Other => Vec::new(),
        }
    }
}
