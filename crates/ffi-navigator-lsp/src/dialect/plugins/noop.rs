//! No-op Plugin
//!
//! The fallback when a repository matches no known convention. It finds
//! nothing, so only generic cursor symbols and import resolution remain.

use std::path::Path;

use ffi_navigator_core::{Fact, ImportResolver, LineWindow};

use crate::dialect::traits::DialectProvider;

/// Fallback dialect that extracts nothing
#[derive(Debug, Clone, Copy)]
pub struct NoopProvider;

impl NoopProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoopProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DialectProvider for NoopProvider {
    fn name(&self) -> &str {
        "noop"
    }

    fn extract(
        &self,
        _path: &Path,
        _lines: &[&str],
        _window: LineWindow,
        _resolver: &ImportResolver,
    ) -> Vec<Fact> {
        Vec::new()
    }
}
