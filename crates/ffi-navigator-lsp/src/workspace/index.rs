//! Fact Index
//!
//! Key-indexed storage for the facts of one workspace generation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ffi_navigator_core::{module_path, Definition, Export, Fact, Reference};
use tracing::warn;

/// Definitions and references by key, exports by defining module
#[derive(Debug, Default)]
pub struct FactIndex {
    key2defs: HashMap<String, Vec<Definition>>,
    key2refs: HashMap<String, Vec<Reference>>,
    modpath2exports: HashMap<PathBuf, Vec<Export>>,
}

impl FactIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// File `fact` under its key; returns false when it was dropped.
    ///
    /// Facts with an empty key and cursor-only symbols are not indexed.
    pub fn insert(&mut self, fact: Fact) -> bool {
        match fact {
            Fact::Definition(def) if !def.key.is_empty() => {
                self.key2defs.entry(def.key.clone()).or_default().push(def);
            }
            Fact::Reference(reference) if !reference.key.is_empty() => {
                self.key2refs
                    .entry(reference.key.clone())
                    .or_default()
                    .push(reference);
            }
            Fact::Export(export) => {
                self.modpath2exports
                    .entry(module_path(&export.path))
                    .or_default()
                    .push(export);
            }
            other => {
                warn!("Dropping unexpected {} fact: {:?}", other.kind(), other);
                return false;
            }
        }
        true
    }

    pub fn defs(&self, key: &str) -> &[Definition] {
        self.key2defs.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn refs(&self, key: &str) -> &[Reference] {
        self.key2refs.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Exports registered by `module`, in registration order
    pub fn exports(&self, module: &Path) -> &[Export] {
        self.modpath2exports
            .get(module)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every export with the module it was registered under
    pub fn all_exports(&self) -> impl Iterator<Item = (&Path, &Export)> + '_ {
        self.modpath2exports.iter().flat_map(|(module, exports)| {
            exports.iter().map(move |export| (module.as_path(), export))
        })
    }

    pub fn definition_keys(&self) -> usize {
        self.key2defs.len()
    }

    pub fn reference_keys(&self) -> usize {
        self.key2refs.len()
    }

    pub fn export_count(&self) -> usize {
        self.modpath2exports.values().map(Vec::len).sum()
    }
}
