//! Host-language (Python) helpers
//!
//! Import statement discovery, whole-token search and expression extraction
//! at a cursor. All of these work line by line on raw text.

use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use crate::facts::Symbol;
use crate::position::{byte_offset, char_column, Position, Range};

/// One imported name.
///
/// `from m import a as b` gives `from_mod = Some("m")`, `name = "a"`,
/// `alias = Some("b")`. A plain `import a.b` has no `from_mod`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyImport {
    pub from_mod: Option<String>,
    pub name: String,
    pub alias: Option<String>,
}

impl PyImport {
    /// The name this import binds in the importing module
    pub fn local_name(&self) -> &str {
        if let Some(alias) = &self.alias {
            return alias;
        }
        match self.from_mod {
            Some(_) => &self.name,
            // `import a.b` binds `a`
            None => self.name.split('.').next().unwrap_or(&self.name),
        }
    }
}

fn from_import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*from\s+(?P<mod>\S+)\s+import\b").expect("valid from-import regex")
    })
}

fn plain_import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*import\s+").expect("valid import regex"))
}

fn import_item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<name>[^\s()]+)(?:\s+as\s+(?P<alias>[^\s()]+))?")
            .expect("valid import item regex")
    })
}

fn import_items(list: &str) -> impl Iterator<Item = (String, Option<String>)> + '_ {
    list.trim()
        .trim_end_matches('\\')
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(',')
        .filter_map(|item| {
            let caps = import_item_re().captures(item.trim())?;
            let name = caps.name("name")?.as_str();
            if name == "*" {
                return None;
            }
            let alias = caps.name("alias").map(|m| m.as_str().to_string());
            Some((name.to_string(), alias))
        })
}

/// Discover `from m import a [as b], ...` and `import a.b [as c]` statements.
///
/// Statements continued over several lines only contribute the names on
/// their first line.
pub fn find_py_imports(lines: &[&str]) -> Vec<PyImport> {
    let mut results = Vec::new();
    for line in lines {
        let code = line.split('#').next().unwrap_or_default();

        if let Some(caps) = from_import_re().captures(code) {
            let (Some(whole), Some(from_mod)) = (caps.get(0), caps.name("mod")) else {
                continue;
            };
            for (name, alias) in import_items(&code[whole.end()..]) {
                results.push(PyImport {
                    from_mod: Some(from_mod.as_str().to_string()),
                    name,
                    alias,
                });
            }
        } else if let Some(whole) = plain_import_re().find(code) {
            for (name, alias) in import_items(&code[whole.end()..]) {
                results.push(PyImport {
                    from_mod: None,
                    name,
                    alias,
                });
            }
        }
    }
    results
}

const DELIMITERS: &str = r"[\s.,()\[\]{}:=+\-*]";

/// Whole-token search for any of `terms`.
///
/// A hit must be bounded on both sides by whitespace, punctuation or the
/// line edge, so `_make` never matches inside `_make2`. Every hit on every
/// line is reported.
pub fn search_symbol(lines: &[&str], terms: &[&str]) -> Vec<Range> {
    let mut terms: Vec<&str> = terms.iter().copied().filter(|t| !t.is_empty()).collect();
    if terms.is_empty() {
        return Vec::new();
    }
    // Longer terms first so `a.b` wins over `a` at the same start
    terms.sort_by_key(|t| std::cmp::Reverse(t.len()));

    let alternatives = terms
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(
        "(?:^|{delim})(?P<name>{alternatives})(?:$|{delim})",
        delim = DELIMITERS
    );
    let regex = match Regex::new(&pattern) {
        Ok(regex) => regex,
        Err(err) => {
            warn!("Skipping symbol search over {} terms: {}", terms.len(), err);
            return Vec::new();
        }
    };

    let mut results = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        let mut pos = 0;
        while pos <= line.len() {
            let Some(name) = regex.captures_at(line, pos).and_then(|c| c.name("name")) else {
                break;
            };
            results.push(Range::on_line(
                idx as u32,
                char_column(line, name.start()),
                char_column(line, name.end()),
            ));
            // The trailing delimiter may open the next hit
            pos = name.end();
        }
    }
    results
}

fn namespace_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[A-Za-z_][A-Za-z0-9_.]*$").expect("valid namespace prefix regex")
    })
}

fn var_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.]+").expect("valid variable name regex"))
}

/// The dotted expression under the cursor, namespace prefix included.
///
/// Grows left over `a.b.` and right over the rest of the identifier. Returns
/// `None` when the expression is immediately followed by a quote: that
/// token is a string key, which dialect matchers handle instead.
pub fn extract_symbol(lines: &[&str], pos: Position) -> Option<Symbol> {
    let line = lines.get(pos.line as usize)?;
    let cursor = byte_offset(line, pos.character);

    let start = namespace_prefix_re()
        .find(&line[..cursor])
        .map_or(cursor, |m| m.start());
    let end = var_name_re()
        .find(&line[cursor..])
        .map_or(cursor, |m| cursor + m.end());

    if matches!(line[end..].chars().next(), Some('"' | '\'')) {
        return None;
    }
    let value = &line[start..end];
    if value.is_empty() {
        return None;
    }
    Some(Symbol {
        value: value.to_string(),
    })
}
