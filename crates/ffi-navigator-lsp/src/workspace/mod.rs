//! Workspace Index
//!
//! Owns the facts of every scanned file and answers definition and
//! reference queries across the language boundary.
//!
//! # Components
//!
//! - `index`: Key-indexed storage for definitions, references and exports
//! - `scanner`: Scan directory and source file discovery
//!
//! A reload builds a complete new generation off to the side and swaps it
//! in, so a query sees either the previous index or the new one.

mod index;
pub mod scanner;


pub use index::FactIndex;

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use ffi_navigator_core::{
    extract_symbol as generic_symbol, search_symbol, split_lines, Definition, Fact,
    ImportResolver, ImportTarget, LineWindow, Location, Position, Reference,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::dialect::{DialectKind, DialectRegistry, SourceKind};
use crate::error::{NavigatorError, Result};

/// What a reload scans, fixed by `initialize`
#[derive(Debug, Clone)]
struct ScanPlan {
    root: PathBuf,
    settings: Settings,
    dialects: Vec<DialectKind>,
}

/// One complete generation of indexed state
#[derive(Debug)]
struct Snapshot {
    root: PathBuf,
    registry: DialectRegistry,
    resolver: ImportResolver,
    index: FactIndex,
    files: usize,
}

#[derive(Debug)]
enum State {
    Uninitialized,
    Ready {
        plan: ScanPlan,
        snapshot: Arc<Snapshot>,
    },
}

/// Summary of the current index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceStats {
    pub root: PathBuf,
    pub dialects: Vec<String>,
    pub files: usize,
    pub definition_keys: usize,
    pub reference_keys: usize,
    pub exports: usize,
}

/// The indexed state of one source tree.
///
/// Every query method takes `&self`; the workspace can be shared across
/// threads behind an `Arc`.
#[derive(Debug)]
pub struct Workspace {
    state: RwLock<State>,
    needs_reload: AtomicBool,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    /// An uninitialized workspace; every query returns nothing until
    /// [`initialize`](Self::initialize) succeeds.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::Uninitialized),
            needs_reload: AtomicBool::new(false),
        }
    }

    /// Load settings, select dialects and index the tree under `root`.
    ///
    /// Calling it again re-targets the workspace.
    pub fn initialize(&self, root: &Path) -> Result<()> {
        if !root.is_dir() {
            return Err(NavigatorError::InvalidRoot(root.to_path_buf()));
        }
        let root = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        info!("Initializing workspace {}", root.display());

        let settings = Settings::load(&root)?;
        let dialects = DialectKind::select(&root, &settings.dialects)?;
        let plan = ScanPlan {
            root,
            settings,
            dialects,
        };

        self.needs_reload.store(false, Ordering::SeqCst);
        let snapshot = Snapshot::build(&plan)?;
        self.publish(plan, snapshot);
        Ok(())
    }

    /// Rescan the tree with the plan of the last `initialize`
    pub fn reload(&self) -> Result<()> {
        let plan = match &*self.read_state() {
            State::Ready { plan, .. } => plan.clone(),
            State::Uninitialized => {
                debug!("Reload requested before initialize, ignoring");
                return Ok(());
            }
        };
        info!("Reloading workspace {}", plan.root.display());
        let snapshot = Snapshot::build(&plan)?;
        self.publish(plan, snapshot);
        Ok(())
    }

    /// Schedule a reload before the next query
    pub fn mark_needs_reload(&self) {
        debug!("Workspace marked for reload");
        self.needs_reload.store(true, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        matches!(&*self.read_state(), State::Ready { .. })
    }

    /// Canonical root of the indexed tree
    pub fn root(&self) -> Option<PathBuf> {
        match &*self.read_state() {
            State::Ready { plan, .. } => Some(plan.root.clone()),
            State::Uninitialized => None,
        }
    }

    /// Definitions of the expression `sym_name` as seen from module `mod_path`.
    ///
    /// `mod_path` may be a `.py` file path. A name that resolves to a whole
    /// module has no definition site.
    pub fn find_defs(&self, mod_path: &Path, sym_name: &str) -> Vec<Definition> {
        let mod_path = query_path(mod_path);
        self.snapshot()
            .map(|snapshot| snapshot.find_defs(&mod_path, sym_name))
            .unwrap_or_default()
    }

    /// Every reference to `key`: the indexed ones, then textual uses
    /// through the exports that cover it.
    pub fn find_refs(&self, key: &str) -> Vec<Reference> {
        self.snapshot()
            .map(|snapshot| snapshot.find_refs(key))
            .unwrap_or_default()
    }

    /// Definitions registered under exactly `key`
    pub fn defs_for_key(&self, key: &str) -> Vec<Definition> {
        self.snapshot()
            .map(|snapshot| snapshot.index.defs(key).to_vec())
            .unwrap_or_default()
    }

    /// What the cursor at `pos` sits on.
    ///
    /// Providers are asked in order; when none recognizes the spot the
    /// dotted expression under the cursor is returned as a symbol.
    pub fn extract_symbol(&self, path: &Path, lines: &[&str], pos: Position) -> Option<Fact> {
        if let Some(snapshot) = self.snapshot() {
            let path = query_path(path);
            let hit = snapshot
                .registry
                .providers()
                .iter()
                .find_map(|provider| provider.extract_symbol(&path, lines, pos, &snapshot.resolver));
            if hit.is_some() {
                return hit;
            }
        }
        generic_symbol(lines, pos).map(Fact::Symbol)
    }

    /// Definition sites for the cursor at `pos` in `path`
    pub fn definitions_at(&self, path: &Path, lines: &[&str], pos: Position) -> Vec<Location> {
        let path = query_path(path);
        let defs = match self.extract_symbol(&path, lines, pos) {
            Some(Fact::Definition(def)) => self.defs_for_key(&def.key),
            Some(Fact::Reference(reference)) => self.defs_for_key(&reference.key),
            Some(Fact::Symbol(symbol)) => self.find_defs(&path, &symbol.value),
            Some(Fact::Export(_)) | None => Vec::new(),
        };
        dedup_locations(defs.iter().map(Location::from))
    }

    /// Reference sites for the cursor at `pos` in `path`
    pub fn references_at(&self, path: &Path, lines: &[&str], pos: Position) -> Vec<Location> {
        let path = query_path(path);
        let keys = match self.extract_symbol(&path, lines, pos) {
            Some(Fact::Definition(def)) => vec![def.key],
            Some(Fact::Reference(reference)) => vec![reference.key],
            Some(Fact::Symbol(symbol)) => {
                let mut keys: Vec<String> = Vec::new();
                for def in self.find_defs(&path, &symbol.value) {
                    if !keys.contains(&def.key) {
                        keys.push(def.key);
                    }
                }
                keys
            }
            Some(Fact::Export(_)) | None => Vec::new(),
        };
        let refs: Vec<Reference> = keys.iter().flat_map(|key| self.find_refs(key)).collect();
        dedup_locations(refs.iter().map(Location::from))
    }

    /// Counts for the current index, `None` before `initialize`
    pub fn stats(&self) -> Option<WorkspaceStats> {
        let snapshot = self.snapshot()?;
        Some(WorkspaceStats {
            root: snapshot.root.clone(),
            dialects: snapshot
                .registry
                .names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            files: snapshot.files,
            definition_keys: snapshot.index.definition_keys(),
            reference_keys: snapshot.index.reference_keys(),
            exports: snapshot.index.export_count(),
        })
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, plan: ScanPlan, snapshot: Snapshot) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = State::Ready {
            plan,
            snapshot: Arc::new(snapshot),
        };
    }

    /// The current generation, reloading first when one was requested
    fn snapshot(&self) -> Option<Arc<Snapshot>> {
        if self.needs_reload.swap(false, Ordering::SeqCst) {
            if let Err(e) = self.reload() {
                warn!("Reload failed, keeping the previous index: {}", e);
            }
        }
        match &*self.read_state() {
            State::Ready { snapshot, .. } => Some(Arc::clone(snapshot)),
            State::Uninitialized => None,
        }
    }
}

impl Snapshot {
    /// Scan every file of `plan`: the init pass over all of them, then
    /// extraction.
    fn build(plan: &ScanPlan) -> Result<Self> {
        let mut registry = DialectRegistry::from_kinds(&plan.dialects)?;
        let dirs = scanner::scan_dirs(
            &plan.root,
            &plan.settings.workspace,
            registry.additional_scan_dirs(&plan.root),
        );
        for dir in &dirs {
            debug!("Scan directory {}", dir.display());
        }
        let files = scanner::collect_files(&dirs, &plan.settings.workspace.extensions)?;
        info!("Scanning {} files under {}", files.len(), plan.root.display());

        let sources: Vec<(PathBuf, String)> = files
            .into_iter()
            .filter_map(|path| match read_source(&path) {
                Ok(text) => Some((path, text)),
                Err(e) => {
                    warn!("Cannot read {}: {}", path.display(), e);
                    None
                }
            })
            .collect();

        // Package roots first, so absolute imports resolve in every file
        let mut resolver = ImportResolver::new();
        for (path, text) in &sources {
            let lines = split_lines(text);
            for provider in registry.providers_mut() {
                provider.init_pass(path, &lines, &mut resolver);
            }
        }
        for (path, text) in &sources {
            if SourceKind::of(path) == SourceKind::Python {
                resolver.update_doc(path, &split_lines(text));
            }
        }

        let mut index = FactIndex::new();
        for (path, text) in &sources {
            let lines = split_lines(text);
            for provider in registry.providers() {
                for fact in provider.extract(path, &lines, LineWindow::all(), &resolver) {
                    index.insert(fact);
                }
            }
        }

        info!(
            "Indexed {} files: {} definition keys, {} reference keys, {} exports",
            sources.len(),
            index.definition_keys(),
            index.reference_keys(),
            index.export_count()
        );
        Ok(Self {
            root: plan.root.clone(),
            registry,
            resolver,
            index,
            files: sources.len(),
        })
    }

    fn find_defs(&self, mod_path: &Path, sym_name: &str) -> Vec<Definition> {
        let (module, var) = self.resolver.resolve(mod_path, sym_name);
        let Some(var) = var else {
            debug!("{} resolves to module {}", sym_name, module.display());
            return Vec::new();
        };

        let mut modules = vec![module.clone()];
        let canonical = self.resolver.canonical_module(&module);
        if canonical != module {
            modules.push(canonical);
        }
        for module in &modules {
            for export in self.index.exports(module) {
                let defs = self.index.defs(&export.var_to_key(&var));
                if !defs.is_empty() {
                    return defs.to_vec();
                }
            }
        }
        Vec::new()
    }

    fn find_refs(&self, key: &str) -> Vec<Reference> {
        let mut refs = self.index.refs(key).to_vec();

        let mut terms: BTreeMap<PathBuf, BTreeSet<String>> = BTreeMap::new();
        for (export_module, export) in self.index.all_exports() {
            if !export.covers(key) {
                continue;
            }
            let var = export.key_to_var(key);
            for (importer, alias, target) in self.resolver.imports() {
                if let Some(term) = self.import_term(export_module, &var, alias, target) {
                    terms.entry(importer.to_path_buf()).or_default().insert(term);
                }
            }
        }

        for (importer, terms) in terms {
            let path = source_file(importer);
            let text = match read_source(&path) {
                Ok(text) => text,
                Err(e) => {
                    debug!("Skipping {} in reference search: {}", path.display(), e);
                    continue;
                }
            };
            let terms: Vec<&str> = terms.iter().map(String::as_str).collect();
            let hits = search_symbol(&split_lines(&text), &terms);
            refs.extend(hits.into_iter().map(|range| Reference {
                key: key.to_string(),
                path: path.clone(),
                range,
            }));
        }
        refs
    }

    /// How a file that made `alias` refers to `var` of `export_module`, if at all
    fn import_term(
        &self,
        export_module: &Path,
        var: &str,
        alias: &str,
        target: &ImportTarget,
    ) -> Option<String> {
        let module = self.resolver.canonical_module(&target.module);
        match &target.name {
            // from m import var as alias
            Some(name) if module == export_module && name == var => Some(alias.to_string()),
            // from pkg import m as alias; alias.var
            Some(name)
                if self.resolver.canonical_module(&target.module.join(name)) == export_module =>
            {
                Some(format!("{}.{}", alias, var))
            }
            // import m as alias; alias.var
            None if module == export_module => Some(format!("{}.{}", alias, var)),
            _ => None,
        }
    }
}

/// Remove repeated (path, range) pairs, keeping first-seen order
pub fn dedup_locations(locations: impl IntoIterator<Item = Location>) -> Vec<Location> {
    let mut seen = HashSet::new();
    locations
        .into_iter()
        .filter(|location| seen.insert(location.clone()))
        .collect()
}

/// `path` in the form the index stores, with symlinks resolved.
///
/// Module paths have no file behind them, so their parent is resolved
/// instead. Anything that cannot be resolved is used as given.
fn query_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => fs::canonicalize(parent)
            .map(|parent| parent.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}

/// Text of `path`; invalid UTF-8 is replaced rather than rejected
fn read_source(path: &Path) -> std::io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// The `.py` file of a module path
fn source_file(module: PathBuf) -> PathBuf {
    let mut file = OsString::from(module);
    file.push(".py");
    PathBuf::from(file)
}
