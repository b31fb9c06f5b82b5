//! Matcher factories
//!
//! Each matcher is built once from its regex and then applied to any number
//! of files. The mapping from a match to a fact is supplied per call, so a
//! caller can consult its own state (for example an import resolver) while
//! deciding whether a match really is a registration.

use regex::{Captures, Regex};

use crate::error::{PatternError, Result};
use crate::facts::Fact;
use crate::position::{char_column, Position, Range};

/// The lines of a file to scan, `begin..end`.
///
/// `end == None` means "to the end of the file"; an `end` past the file
/// length is clamped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineWindow {
    pub begin: usize,
    pub end: Option<usize>,
}

impl LineWindow {
    /// The whole file
    pub fn all() -> Self {
        Self::default()
    }

    /// Lines `begin..end`
    pub fn new(begin: usize, end: usize) -> Self {
        Self {
            begin,
            end: Some(end),
        }
    }

    /// The line above, the line itself and the line below
    pub fn around(line: u32) -> Self {
        let line = line as usize;
        Self::new(line.saturating_sub(1), line + 2)
    }

    /// Concrete line indices for a file with `len` lines
    pub fn bounds(&self, len: usize) -> std::ops::Range<usize> {
        let end = self.end.map_or(len, |end| end.min(len));
        self.begin.min(end)..end
    }
}

/// Whether a single-line regex must match at the start of the line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Match only at column 0
    Anchored,
    /// Match anywhere in the line
    Search,
}

/// A key found by one of the name-based matchers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyHit<'a> {
    /// The string key
    pub key: &'a str,
    /// Which macro, function or decorator produced it, as written
    pub name: &'a str,
    /// Range of the key itself
    pub range: Range,
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|err| PatternError::invalid(pattern, err))
}

fn alternation(names: &[&str]) -> Result<String> {
    if names.is_empty() {
        return Err(PatternError::NoNames);
    }
    Ok(names
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|"))
}

fn line_range(line_idx: usize, line: &str, start: usize, end: usize) -> Range {
    Range::on_line(
        line_idx as u32,
        char_column(line, start),
        char_column(line, end),
    )
}

/// Free regex matcher, one match per line.
///
/// The reported range covers the `key` group when the pattern has one,
/// otherwise the whole match.
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    regex: Regex,
}

impl RegexMatcher {
    pub fn new(pattern: &str, mode: MatchMode) -> Result<Self> {
        let regex = match mode {
            MatchMode::Anchored => compile(&format!("^(?:{})", pattern))?,
            MatchMode::Search => compile(pattern)?,
        };
        Ok(Self { regex })
    }

    pub fn find<F>(&self, lines: &[&str], window: LineWindow, mut create: F) -> Vec<Fact>
    where
        F: FnMut(&Captures<'_>, Range) -> Option<Fact>,
    {
        let mut facts = Vec::new();
        for idx in window.bounds(lines.len()) {
            let line = lines[idx];
            let Some(caps) = self.regex.captures(line) else {
                continue;
            };
            let Some(span) = caps.name("key").or_else(|| caps.get(0)) else {
                continue;
            };
            let range = line_range(idx, line, span.start(), span.end());
            if let Some(fact) = create(&caps, range) {
                facts.push(fact);
            }
        }
        facts
    }
}

/// Regex matcher over the whole file, for constructs that span lines.
///
/// The file is joined with `\n` and searched once; match offsets are mapped
/// back to line/column through a prefix sum of line lengths.
#[derive(Debug, Clone)]
pub struct MultiLineMatcher {
    regex: Regex,
}

impl MultiLineMatcher {
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            regex: compile(pattern)?,
        })
    }

    pub fn find<F>(&self, lines: &[&str], mut create: F) -> Vec<Fact>
    where
        F: FnMut(&Captures<'_>, Range) -> Option<Fact>,
    {
        let buffer = lines.join("\n");

        // line_ends[i] = offset one past the '\n' that terminates line i
        let mut line_ends = Vec::with_capacity(lines.len());
        let mut total = 0;
        for line in lines {
            total += line.len() + 1;
            line_ends.push(total);
        }
        let line_start = |line: usize| if line == 0 { 0 } else { line_ends[line - 1] };

        let mut facts = Vec::new();
        for caps in self.regex.captures_iter(&buffer) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let start_line = line_ends.partition_point(|&end| end <= whole.start());
            let end_line = start_line + whole.as_str().matches('\n').count();

            // line_start(l) <= offset for both ends by construction of the
            // prefix sum and the newline count
            let start_byte = whole.start() - line_start(start_line);
            let end_byte = whole.end() - line_start(end_line);
            let start_col = lines
                .get(start_line)
                .map_or(start_byte as u32, |line| char_column(line, start_byte));
            let end_col = lines
                .get(end_line)
                .map_or(end_byte as u32, |line| char_column(line, end_byte));

            let range = Range::new(
                Position::new(start_line as u32, start_col),
                Position::new(end_line as u32, end_col),
            );
            if let Some(fact) = create(&caps, range) {
                facts.push(fact);
            }
        }
        facts
    }
}

/// `NAME("key")` at the start of a line, for a fixed set of names.
#[derive(Debug, Clone)]
pub struct MacroMatcher {
    regex: Regex,
}

impl MacroMatcher {
    pub fn new(names: &[&str]) -> Result<Self> {
        let pattern = format!(
            r#"^\s*(?P<name>{})\("(?P<key>[^"]+)""#,
            alternation(names)?
        );
        Ok(Self {
            regex: compile(&pattern)?,
        })
    }

    pub fn find<F>(&self, lines: &[&str], window: LineWindow, mut create: F) -> Vec<Fact>
    where
        F: FnMut(KeyHit<'_>) -> Option<Fact>,
    {
        let mut facts = Vec::new();
        for idx in window.bounds(lines.len()) {
            let line = lines[idx];
            let Some(caps) = self.regex.captures(line) else {
                continue;
            };
            let (Some(name), Some(key)) = (caps.name("name"), caps.name("key")) else {
                continue;
            };
            let hit = KeyHit {
                key: key.as_str(),
                name: name.as_str(),
                range: line_range(idx, line, key.start(), key.end()),
            };
            if let Some(fact) = create(hit) {
                facts.push(fact);
            }
        }
        facts
    }
}

/// Every `NAME("key")` occurrence anywhere in a line.
///
/// Lookups such as `GetPackedFunc("a")` often appear several times on one
/// line; matches are non-overlapping and scanned left to right.
#[derive(Debug, Clone)]
pub struct CallSiteSearcher {
    regex: Regex,
}

impl CallSiteSearcher {
    pub fn new(names: &[&str]) -> Result<Self> {
        let pattern = format!(
            r#"(?P<name>{})\("(?P<key>[^"]+)"\)"#,
            alternation(names)?
        );
        Ok(Self {
            regex: compile(&pattern)?,
        })
    }

    pub fn find<F>(&self, lines: &[&str], window: LineWindow, mut create: F) -> Vec<Fact>
    where
        F: FnMut(KeyHit<'_>) -> Option<Fact>,
    {
        let mut facts = Vec::new();
        for idx in window.bounds(lines.len()) {
            let line = lines[idx];
            for caps in self.regex.captures_iter(line) {
                let (Some(name), Some(key)) = (caps.name("name"), caps.name("key")) else {
                    continue;
                };
                let hit = KeyHit {
                    key: key.as_str(),
                    name: name.as_str(),
                    range: line_range(idx, line, key.start(), key.end()),
                };
                if let Some(fact) = create(hit) {
                    facts.push(fact);
                }
            }
        }
        facts
    }
}

/// Registration decorators: `@[ns.]NAME("key")` or a bare `@[ns.]NAME`.
///
/// A bare decorator takes its key from the declaration on the next line
/// (`def key(` / `class key(`). The decorator text, namespace included, is
/// reported as [`KeyHit::name`] so callers can check what it resolves to.
#[derive(Debug, Clone)]
pub struct DecoratorMatcher {
    decorator: Regex,
    declaration: Regex,
}

impl DecoratorMatcher {
    /// `keyword` is the declaration keyword that follows, `def` or `class`
    pub fn new(names: &[&str], keyword: &str) -> Result<Self> {
        let decorator = format!(
            r#"^\s*@?(?P<decorator>(?:[A-Za-z_][A-Za-z_0-9]*\.)*(?:{}))(?:\("(?P<key>[^"]+)"|\s*(?:\(\s*\))?\s*$)"#,
            alternation(names)?
        );
        let declaration = format!(
            r"^\s*{}\s+(?P<key>[A-Za-z_][A-Za-z_0-9]*)\s*[(:]",
            regex::escape(keyword)
        );
        Ok(Self {
            decorator: compile(&decorator)?,
            declaration: compile(&declaration)?,
        })
    }

    pub fn find<F>(&self, lines: &[&str], window: LineWindow, mut create: F) -> Vec<Fact>
    where
        F: FnMut(KeyHit<'_>) -> Option<Fact>,
    {
        let mut facts = Vec::new();
        for idx in window.bounds(lines.len()) {
            let line = lines[idx];
            let Some(caps) = self.decorator.captures(line) else {
                continue;
            };
            let Some(decorator) = caps.name("decorator") else {
                continue;
            };

            let hit = if let Some(key) = caps.name("key") {
                Some(KeyHit {
                    key: key.as_str(),
                    name: decorator.as_str(),
                    range: line_range(idx, line, key.start(), key.end()),
                })
            } else {
                lines.get(idx + 1).and_then(|next| {
                    let key = self.declaration.captures(next)?.name("key")?;
                    Some(KeyHit {
                        key: key.as_str(),
                        name: decorator.as_str(),
                        range: line_range(idx + 1, next, key.start(), key.end()),
                    })
                })
            };

            if let Some(fact) = hit.and_then(&mut create) {
                facts.push(fact);
            }
        }
        facts
    }
}
