//! Import Resolver
//!
//! Keeps the host-language import graph of every document it has seen and
//! follows `from m import a as b` chains back to the module that really
//! defines a name.
//!
//! Module paths are file paths with the `.py` suffix dropped and `.`/`..`
//! folded lexically; the filesystem is never consulted. A package directory
//! is redirected to its `__init__` module once that file has been seen.
//!
//! Resolution never fails: an alias that cannot be followed any further is
//! reported as defined where the chain stopped.

use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::pattern::find_py_imports;


/// Recursion cap for a single top-level [`ImportResolver::resolve`] call
pub const MAX_RESOLVE_DEPTH: usize = 10;

/// What a local alias denotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTarget {
    /// Module the alias was imported from
    pub module: PathBuf,
    /// Imported name, `None` when the alias is the module itself
    pub name: Option<String>,
}

/// Result of a resolution: the defining module and the name inside it.
///
/// `name == None` means the expression denotes the module as a whole.
pub type Resolved = (PathBuf, Option<String>);

/// Canonical module path of a source file.
///
/// Folds `.` and `..` components and drops a trailing `.py`.
pub fn module_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last_is_name = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                );
                if last_is_name {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    if normalized.extension().is_some_and(|ext| ext == "py") {
        normalized.set_extension("");
    }
    normalized
}

/// Host-language import graph
#[derive(Debug, Clone, Default)]
pub struct ImportResolver {
    modpath2imports: BTreeMap<PathBuf, BTreeMap<String, ImportTarget>>,
    modpath2init: HashMap<PathBuf, PathBuf>,
    pkg2modpath: HashMap<String, PathBuf>,
}

impl ImportResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the root directory of package `name` for absolute imports
    pub fn add_package(&mut self, name: impl Into<String>, root: impl AsRef<Path>) {
        let name = name.into();
        let root = module_path(root.as_ref());
        debug!("Package {} rooted at {}", name, root.display());
        self.pkg2modpath.insert(name, root);
    }

    /// Root registered for package `name`
    pub fn package_root(&self, name: &str) -> Option<&Path> {
        self.pkg2modpath.get(name).map(PathBuf::as_path)
    }

    /// Record the imports of the document at `path`.
    ///
    /// Re-adding a document replaces its previous import table.
    pub fn update_doc(&mut self, path: &Path, lines: &[&str]) {
        let module = module_path(path);
        let dir = module.parent().map(Path::to_path_buf).unwrap_or_default();

        let mut imports = BTreeMap::new();
        for item in find_py_imports(lines) {
            let target = match &item.from_mod {
                Some(from_mod) => ImportTarget {
                    module: self.resolve_mod_path(&dir, from_mod),
                    name: Some(item.name.clone()),
                },
                // `import a.b as c` binds module a/b, `import a.b` binds a
                None if item.alias.is_some() => ImportTarget {
                    module: self.resolve_mod_path(&dir, &item.name),
                    name: None,
                },
                None => ImportTarget {
                    module: self.resolve_mod_path(&dir, item.local_name()),
                    name: None,
                },
            };
            imports.insert(item.local_name().to_string(), target);
        }

        if module.file_name().is_some_and(|name| name == "__init__") {
            if let Some(parent) = module.parent() {
                self.modpath2init.insert(parent.to_path_buf(), module.clone());
            }
        }
        self.modpath2imports.insert(module, imports);
    }

    /// Every recorded import as `(importing module, local alias, target)`
    pub fn imports(&self) -> impl Iterator<Item = (&Path, &str, &ImportTarget)> + '_ {
        self.modpath2imports.iter().flat_map(|(module, imports)| {
            imports
                .iter()
                .map(move |(alias, target)| (module.as_path(), alias.as_str(), target))
        })
    }

    /// `module` with a package directory redirected to its `__init__`
    pub fn canonical_module(&self, module: &Path) -> PathBuf {
        let module = module_path(module);
        match self.modpath2init.get(&module) {
            Some(init) => init.clone(),
            None => module,
        }
    }

    /// Whether a document was recorded for `module` or its `__init__`
    pub fn knows_module(&self, module: &Path) -> bool {
        self.modpath2imports.contains_key(module) || self.modpath2init.contains_key(module)
    }

    /// Resolve the dotted expression `attr` as seen from module `mod_path`.
    ///
    /// A relative `mod_path` whose first component names a registered
    /// package is rooted at that package.
    pub fn resolve(&self, mod_path: &Path, attr: &str) -> Resolved {
        let mut depth = 0;
        let module = module_path(&self.root_package(mod_path));
        self.resolve_attr(module, attr, &mut depth)
    }

    fn root_package(&self, mod_path: &Path) -> PathBuf {
        if mod_path.has_root() {
            return mod_path.to_path_buf();
        }
        let mut components = mod_path.components();
        let root = components
            .next()
            .and_then(|first| first.as_os_str().to_str())
            .and_then(|first| self.pkg2modpath.get(first));
        match root {
            Some(root) => root.join(components.as_path()),
            None => mod_path.to_path_buf(),
        }
    }

    fn resolve_attr(&self, module: PathBuf, attr: &str, depth: &mut usize) -> Resolved {
        let Some((head, rest)) = attr.split_once('.') else {
            return self.resolve_var(module, attr, false, depth);
        };
        match self.resolve_var(module.clone(), head, false, depth) {
            (inner, None) => self.resolve_attr(inner, rest, depth),
            // Attributes of a concrete symbol are not chased
            (_, Some(_)) => (module, Some(attr.to_string())),
        }
    }

    fn resolve_var(
        &self,
        module: PathBuf,
        var: &str,
        allow_combine: bool,
        depth: &mut usize,
    ) -> Resolved {
        *depth += 1;
        if *depth > MAX_RESOLVE_DEPTH {
            debug!("Resolution of {} stopped at depth {}", var, MAX_RESOLVE_DEPTH);
            return (module, Some(var.to_string()));
        }

        if allow_combine {
            let combined = module.join(var);
            if self.knows_module(&combined) {
                return (combined, None);
            }
        }

        let module = match self.modpath2init.get(&module) {
            Some(init) => init.clone(),
            None => module,
        };
        let Some(target) = self
            .modpath2imports
            .get(&module)
            .and_then(|imports| imports.get(var))
        else {
            return (module, Some(var.to_string()));
        };

        match &target.name {
            None => (target.module.clone(), None),
            Some(name) => self.resolve_var(target.module.clone(), name, true, depth),
        }
    }

    /// Module addressed by `from_mod` in a file living in `curr_dir`
    fn resolve_mod_path(&self, curr_dir: &Path, from_mod: &str) -> PathBuf {
        let dots = from_mod.chars().take_while(|&c| c == '.').count();
        let segments: Vec<&str> = from_mod[dots..]
            .split('.')
            .filter(|segment| !segment.is_empty())
            .collect();

        let mut target = if dots > 0 {
            let mut up = curr_dir.to_path_buf();
            for _ in 1..dots {
                up.push("..");
            }
            up
        } else if let Some(root) = segments.first().and_then(|s| self.pkg2modpath.get(*s)) {
            let mut target = root.clone();
            target.extend(&segments[1..]);
            return module_path(&target);
        } else {
            curr_dir.to_path_buf()
        };
        target.extend(&segments);
        module_path(&target)
    }
}
