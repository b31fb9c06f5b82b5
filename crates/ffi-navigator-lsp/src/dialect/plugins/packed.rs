//! Packed-function convention shared by TVM and DGL
//!
//! Native code registers functions with `<PREFIX>_REGISTER_GLOBAL("key")`
//! and looks them up with `GetPackedFunc("key")`. The Python side exposes
//! whole key families through `_init_api("pkg.ns")`, registers Python
//! callbacks with `@register_func` and mirrors node types with
//! `@register_object`.

use std::path::{Path, PathBuf};

use ffi_navigator_core::{
    module_path, CallSiteSearcher, DecoratorMatcher, Export, Fact, ImportResolver, KeyHit,
    LineWindow, MacroMatcher, MatchMode, RegexMatcher,
};
use tracing::info;

use crate::dialect::traits::package_root_of_init;
use crate::error::Result;

const TYPE_KEY_PATTERN: &str =
    r#"\s*static\s+constexpr\sconst\s+char\s*\*\s+_type_key\s*=\s*"(?P<key>[^"]+)""#;

/// Module paths of the Python package, known once its `__init__.py` is seen
#[derive(Debug, Clone)]
struct PackagePaths {
    init: PathBuf,
    function_module: PathBuf,
    api_internal: PathBuf,
}

impl PackagePaths {
    fn new(root: &Path) -> Self {
        let root = module_path(root);
        Self {
            init: root.join("__init__"),
            function_module: root.join("_ffi").join("function"),
            api_internal: root.join("_api_internal"),
        }
    }
}

/// Matchers and package state of one packed-function dialect
#[derive(Debug, Clone)]
pub struct PackedFuncCore {
    package: &'static str,
    cc_def_packed: MacroMatcher,
    cc_def_object: RegexMatcher,
    cc_get_packed: CallSiteSearcher,
    py_init_api: MacroMatcher,
    py_reg_object: DecoratorMatcher,
    py_reg_func: DecoratorMatcher,
    paths: Option<PackagePaths>,
}

impl PackedFuncCore {
    /// `package` is the Python package name, `macros` the native
    /// registration macros and `object_decorators` the class decorators.
    pub fn new(
        package: &'static str,
        macros: &[&str],
        object_decorators: &[&str],
    ) -> Result<Self> {
        Ok(Self {
            package,
            cc_def_packed: MacroMatcher::new(macros)?,
            cc_def_object: RegexMatcher::new(TYPE_KEY_PATTERN, MatchMode::Search)?,
            cc_get_packed: CallSiteSearcher::new(&["GetPackedFunc", "runtime::Registry::Get"])?,
            py_init_api: MacroMatcher::new(&["_init_api"])?,
            py_reg_object: DecoratorMatcher::new(object_decorators, "class")?,
            py_reg_func: DecoratorMatcher::new(&["register_func"], "def")?,
            paths: None,
        })
    }

    /// Register the package root when `path` is `python/<package>/__init__.py`
    pub fn init_pass(&mut self, path: &Path, resolver: &mut ImportResolver) {
        let marker = format!("python/{}", self.package);
        let Some(root) = package_root_of_init(path, &marker) else {
            return;
        };
        info!("{}: found python path {}", self.package, root.display());
        resolver.add_package(self.package, &root);
        self.paths = Some(PackagePaths::new(&root));
    }

    /// Definitions, type keys and lookups in native sources
    pub fn extract_native(&self, path: &Path, lines: &[&str], window: LineWindow) -> Vec<Fact> {
        let mut facts = self.cc_def_packed.find(lines, window, |hit| {
            Some(Fact::def(hit.key, path, hit.range))
        });
        facts.extend(self.cc_def_object.find(lines, window, |caps, range| {
            Some(Fact::def(format!("t:{}", &caps["key"]), path, range))
        }));
        facts.extend(self.cc_get_packed.find(lines, window, |hit| {
            Some(Fact::reference(hit.key, path, hit.range))
        }));
        facts
    }

    /// Exports, object references and `register_func` definitions in Python
    ///
    /// `object_key` maps a decorated class name and the decorator text to
    /// the type key it references.
    pub fn extract_python(
        &self,
        path: &Path,
        lines: &[&str],
        window: LineWindow,
        resolver: &ImportResolver,
        object_key: impl Fn(&str, &str) -> String,
    ) -> Vec<Fact> {
        let mut facts = self.py_init_api.find(lines, window, |hit| {
            self.init_api_export(path, hit.key, resolver)
        });
        facts.extend(self.py_reg_object.find(lines, window, |hit| {
            Some(Fact::reference(object_key(hit.key, hit.name), path, hit.range))
        }));
        facts.extend(self.py_reg_func.find(lines, window, |hit| {
            self.register_func_def(path, hit, resolver)
        }));

        if let Some(paths) = &self.paths {
            if module_path(path).starts_with(&paths.api_internal) {
                facts.push(Fact::Export(Export::identity("_", path)));
            }
        }
        facts
    }

    fn init_api_export(&self, path: &Path, key: &str, resolver: &ImportResolver) -> Option<Fact> {
        let paths = self.paths.as_ref()?;
        let (module, name) = resolver.resolve(path, "_init_api");
        if module != paths.function_module || name.as_deref() != Some("_init_api") {
            return None;
        }
        let package_prefix = format!("{}.", self.package);
        let prefix = key.strip_prefix(&package_prefix).unwrap_or(key);
        Some(Fact::Export(Export::namespaced(prefix, path)))
    }

    fn register_func_def(
        &self,
        path: &Path,
        hit: KeyHit<'_>,
        resolver: &ImportResolver,
    ) -> Option<Fact> {
        let paths = self.paths.as_ref()?;
        let (module, name) = resolver.resolve(path, hit.name);
        let blessed = module == paths.function_module || module == paths.init;
        if !blessed || name.as_deref() != Some("register_func") {
            return None;
        }
        Some(Fact::def(hit.key, path, hit.range))
    }
}
