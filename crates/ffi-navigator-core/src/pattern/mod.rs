//! Pattern Toolkit
//!
//! Regex-driven matchers that scan one file and report located [`Fact`]s.
//! Nothing here builds a syntax tree: every matcher is a pure function of
//! the file's lines, so each one can be tested on a literal snippet.
//!
//! # Matcher shapes
//!
//! - [`RegexMatcher`]: one match per line, anchored or searched
//! - [`MultiLineMatcher`]: matches over the whole file, spanning lines
//! - [`MacroMatcher`]: `NAME("key")` for a fixed set of names
//! - [`CallSiteSearcher`]: every `NAME("key")` occurrence on a line
//! - [`DecoratorMatcher`]: `@ns.NAME("key")`, or a bare decorator whose key
//!   comes from the `def`/`class` on the next line
//!
//! Matchers never look at string or comment context; occasional false
//! positives inside comments are accepted.
//!
//! [`Fact`]: crate::facts::Fact

mod matchers;
mod python;

#[cfg(test)]
mod tests;

pub use matchers::{
    CallSiteSearcher, DecoratorMatcher, KeyHit, LineWindow, MacroMatcher, MatchMode,
    MultiLineMatcher, RegexMatcher,
};
pub use python::{extract_symbol, find_py_imports, search_symbol, PyImport};

/// Split source text into lines without their terminators
pub fn split_lines(text: &str) -> Vec<&str> {
    text.lines().collect()
}
