//! TVM Plugin
//!
//! The packed-function convention with `TVM_` macros, plus the legacy IR
//! registration macros of `api_ir.cc` / `api_pass.cc` and Relay node
//! decorators.

use std::path::Path;

use ffi_navigator_core::{Fact, ImportResolver, LineWindow, MatchMode, RegexMatcher};

use super::packed::PackedFuncCore;
use crate::dialect::traits::{DialectProvider, SourceKind};
use crate::error::Result;

/// Provider for the TVM code base
#[derive(Debug, Clone)]
pub struct TvmProvider {
    core: PackedFuncCore,
    cc_def_make: RegexMatcher,
    cc_def_pass: RegexMatcher,
}

impl TvmProvider {
    pub fn new() -> Result<Self> {
        Ok(Self {
            core: PackedFuncCore::new(
                "tvm",
                &["TVM_REGISTER_API", "TVM_REGISTER_GLOBAL"],
                &["register_object", "register_relay_node"],
            )?,
            cc_def_make: RegexMatcher::new(
                r"\s*(REGISTER_MAKE|REGISTER_MAKE_BINARY_OP)\((?P<key>[A-Za-z0-9]+)",
                MatchMode::Anchored,
            )?,
            cc_def_pass: RegexMatcher::new(
                r"\s*REGISTER_PASS\((?P<key>[A-Za-z0-9]+)\)",
                MatchMode::Anchored,
            )?,
        })
    }
}

fn file_name_is(path: &Path, name: &str) -> bool {
    path.file_name().is_some_and(|file| file == name)
}

impl DialectProvider for TvmProvider {
    fn name(&self) -> &str {
        "tvm"
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
            SourceKind::Native => {
                let mut facts = self.core.extract_native(path, lines, window);
                if file_name_is(path, "api_ir.cc") {
                    facts.extend(self.cc_def_make.find(lines, window, |caps, range| {
                        Some(Fact::def(format!("make.{}", &caps["key"]), path, range))
                    }));
                }
                if file_name_is(path, "api_pass.cc") {
                    facts.extend(self.cc_def_pass.find(lines, window, |caps, range| {
                        Some(Fact::def(format!("ir_pass.{}", &caps["key"]), path, range))
                    }));
                }
                facts
            }
            SourceKind::Python => {
                self.core
                    .extract_python(path, lines, window, resolver, |key, decorator| {
                        if decorator.ends_with("relay_node") {
                            format!("t:relay.{}", key)
                        } else {
                            format!("t:{}", key)
                        }
                    })
            }
            SourceKind::Other => Vec::new(),
        }
    }
}
