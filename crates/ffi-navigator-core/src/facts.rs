//! Located facts about FFI registrations
//!
//! Matchers turn source text into [`Fact`]s. A fact either declares that a
//! key is defined or used somewhere, or that a host-language module exposes a
//! family of keys as local variables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::position::Range;

/// `key` is registered at `path`/`range`.
///
/// Keys are opaque registry identifiers such as `relay.backend.lower`,
/// `t:relay.GlobalVar` or a bare API name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub key: String,
    pub path: PathBuf,
    pub range: Range,
}

/// `key` is looked up or used at `path`/`range`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub key: String,
    pub path: PathBuf,
    pub range: Range,
}

/// How an [`Export`] turns local variable names into keys and back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyMapping {
    /// The variable name is the key
    Identity,
    /// `prefix.var` <-> `var`
    Namespaced,
}

/// A module exposes every key starting with `key_prefix` as a local variable.
///
/// Models the generated-wrapper indirection of `_init_api("prefix")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Export {
    pub key_prefix: String,
    pub path: PathBuf,
    pub mapping: KeyMapping,
}

impl Export {
    /// Export of `prefix.<var>` keys
    pub fn namespaced(key_prefix: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            key_prefix: key_prefix.into(),
            path: path.into(),
            mapping: KeyMapping::Namespaced,
        }
    }

    /// Export where variable names are used verbatim as keys
    pub fn identity(key_prefix: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            key_prefix: key_prefix.into(),
            path: path.into(),
            mapping: KeyMapping::Identity,
        }
    }

    /// Literal string-prefix test on `key`
    pub fn covers(&self, key: &str) -> bool {
        key.starts_with(&self.key_prefix)
    }

    /// Key registered for the local variable `var`
    pub fn var_to_key(&self, var: &str) -> String {
        match self.mapping {
            KeyMapping::Identity => var.to_string(),
            KeyMapping::Namespaced => format!("{}.{}", self.key_prefix, var),
        }
    }

    /// Local variable name under which `key` is exposed
    pub fn key_to_var(&self, key: &str) -> String {
        match self.mapping {
            KeyMapping::Identity => key.to_string(),
            KeyMapping::Namespaced => key
                .get(self.key_prefix.len() + 1..)
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// A raw dotted expression taken from under the cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub value: String,
}

/// Anything a matcher can report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Fact {
    Definition(Definition),
    Reference(Reference),
    Export(Export),
    Symbol(Symbol),
}

impl Fact {
    /// Definition of `key` at `path`/`range`
    pub fn def(key: impl Into<String>, path: &Path, range: Range) -> Self {
        Fact::Definition(Definition {
            key: key.into(),
            path: path.to_path_buf(),
            range,
        })
    }

    /// Reference to `key` at `path`/`range`
    pub fn reference(key: impl Into<String>, path: &Path, range: Range) -> Self {
        Fact::Reference(Reference {
            key: key.into(),
            path: path.to_path_buf(),
            range,
        })
    }

    /// Short name of the fact kind, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Fact::Definition(_) => "definition",
            Fact::Reference(_) => "reference",
            Fact::Export(_) => "export",
            Fact::Symbol(_) => "symbol",
        }
    }

    /// Registry key of a definition or reference
    pub fn key(&self) -> Option<&str> {
        match self {
            Fact::Definition(def) => Some(&def.key),
            Fact::Reference(reference) => Some(&reference.key),
            Fact::Export(_) | Fact::Symbol(_) => None,
        }
    }

    /// Source range of a definition or reference
    pub fn range(&self) -> Option<Range> {
        match self {
            Fact::Definition(def) => Some(def.range),
            Fact::Reference(reference) => Some(reference.range),
            Fact::Export(_) | Fact::Symbol(_) => None,
        }
    }
}

/// A file location, the unit results are reported in
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub path: PathBuf,
    pub range: Range,
}

impl From<&Definition> for Location {
    fn from(def: &Definition) -> Self {
        Self {
            path: def.path.clone(),
            range: def.range,
        }
    }
}

impl From<&Reference> for Location {
    fn from(reference: &Reference) -> Self {
        Self {
            path: reference.path.clone(),
            range: reference.range,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaced_export_mapping() {
        let export = Export::namespaced("ns", "/b.py");
        assert_eq!(export.var_to_key("bar"), "ns.bar");
        assert_eq!(export.key_to_var("ns.bar"), "bar");
        assert!(export.covers("ns.bar"));
        assert!(!export.covers("other.bar"));
    }

    #[test]
    fn test_export_key_roundtrip() {
        let namespaced = Export::namespaced("relay.op", "/x.py");
        let identity = Export::identity("_", "/tvm/_api_internal.py");

        for key in ["relay.op.add", "relay.op._make.conv2d", "relay.op.x"] {
            assert!(namespaced.covers(key));
            assert_eq!(namespaced.var_to_key(&namespaced.key_to_var(key)), key);
        }
        for key in ["_GetDevice", "_copy"] {
            assert!(identity.covers(key));
            assert_eq!(identity.var_to_key(&identity.key_to_var(key)), key);
        }
    }

    #[test]
    fn test_key_to_var_on_bare_prefix_is_empty() {
        let export = Export::namespaced("ns", "/b.py");
        assert_eq!(export.key_to_var("ns"), "");
    }

    #[test]
    fn test_fact_accessors() {
        let range = Range::on_line(3, 1, 4);
        let def = Fact::def("a.b", Path::new("/x.cc"), range);
        assert_eq!(def.kind(), "definition");
        assert_eq!(def.key(), Some("a.b"));
        assert_eq!(def.range(), Some(range));

        let sym = Fact::Symbol(Symbol {
            value: "x.y".to_string(),
        });
        assert_eq!(sym.key(), None);
        assert_eq!(sym.range(), None);
    }

    #[test]
    fn test_fact_serializes_with_kind_tag() {
        let fact = Fact::reference("k", Path::new("/a.py"), Range::default());
        let json = serde_json::to_value(&fact).unwrap();
        assert_eq!(json["kind"], "reference");
        assert_eq!(json["key"], "k");
    }
}
