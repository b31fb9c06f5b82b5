//! PyTorch Plugin
//!
//! Operators are registered in C++ with `.op("ns::name")` and surfaced to
//! Python through generated binding tables (`{"name", ...}`). Python code
//! reaches them as `torch.ops.ns.name` or `torch.name`.

use std::path::{Path, PathBuf};

use ffi_navigator_core::{Fact, ImportResolver, LineWindow, MatchMode, Position, RegexMatcher};
use tracing::{debug, info};

use crate::dialect::traits::{first_touching, package_root_of_init, DialectProvider, SourceKind};
use crate::error::Result;

/// Generated binding sources, relative to their `generated/` directory
const GENERATED_BINDINGS: &[&str] = &[
    "python_nn_functions.cpp",
    "python_torch_functions.cpp",
    "python_variable_methods.cpp",
];

/// Provider for the PyTorch code base
#[derive(Debug, Clone)]
pub struct TorchProvider {
    c10_reg: RegexMatcher,
    cpp_generated: RegexMatcher,
    py_ops: RegexMatcher,
    py_variable_methods: RegexMatcher,
}

impl TorchProvider {
    pub fn new() -> Result<Self> {
        Ok(Self {
            c10_reg: RegexMatcher::new(
                r#"\.op\(\s*"(?P<key>[a-z0-9_:]+)(.*)""#,
                MatchMode::Search,
            )?,
            cpp_generated: RegexMatcher::new(r#"\{"(?P<key>[a-z0-9_:]+)""#, MatchMode::Search)?,
            py_ops: RegexMatcher::new(
                r"ops\.(?P<namespace>[a-z0-9_]+)\.(?P<op>[a-z0-9_]+)",
                MatchMode::Search,
            )?,
            py_variable_methods: RegexMatcher::new(
                r"torch\.([A-Za-z0-9_]+\.)*(?P<op>[a-z0-9_]+)",
                MatchMode::Search,
            )?,
        })
    }

    fn extract_python(&self, path: &Path, lines: &[&str], window: LineWindow) -> Vec<Fact> {
        let mut facts = self.py_ops.find(lines, window, |caps, range| {
            let key = format!("{}::{}", &caps["namespace"], &caps["op"]);
            Some(Fact::reference(key, path, range))
        });
        facts.extend(self.py_variable_methods.find(lines, window, |caps, range| {
            Some(Fact::reference(format!("aten:{}", &caps["op"]), path, range))
        }));
        facts
    }
}

fn is_generated_binding(path: &Path) -> bool {
    GENERATED_BINDINGS
        .iter()
        .any(|name| path.ends_with(Path::new("generated").join(name)))
}

impl DialectProvider for TorchProvider {
    fn name(&self) -> &str {
        "torch"
    }

    fn init_pass(&mut self, path: &Path, _lines: &[&str], resolver: &mut ImportResolver) {
        if let Some(root) = package_root_of_init(path, "torch") {
            info!("torch: found python path {}", root.display());
            resolver.add_package("torch", &root);
        }
    }

    fn extract(
        &self,
        path: &Path,
        lines: &[&str],
        window: LineWindow,
        _resolver: &ImportResolver,
    ) -> Vec<Fact> {
        let is_cpp = path.extension().is_some_and(|ext| ext == "cpp");
        let is_test = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().ends_with("_test.cpp"));
        if !is_cpp || is_test {
            return Vec::new();
        }
        debug!("torch: extracting from {}", path.display());

        let mut facts = self.c10_reg.find(lines, window, |caps, range| {
            Some(Fact::def(&caps["key"], path, range))
        });
        if is_generated_binding(path) {
            facts.extend(self.cpp_generated.find(lines, window, |caps, range| {
                Some(Fact::def(format!("aten:{}", &caps["key"]), path, range))
            }));
        }
        facts
    }

    /// Python operator uses are resolved at the cursor only, never indexed
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

    fn additional_scan_dirs(&self, root: &Path) -> Vec<PathBuf> {
        vec![root.join("aten").join("src").join("ATen"), root.join("torch")]
    }
}
