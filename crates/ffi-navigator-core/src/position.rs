//! Source coordinates
//!
//! Zero-based line/character positions and the spans built from them.
//! Every fact produced by the pattern toolkit is located with a [`Range`].

use serde::{Deserialize, Serialize};

/// A zero-based position in a text document.
///
/// `character` counts Unicode scalar values from the start of the line.
/// Positions order by line first, then by character.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Position {
    /// Line number (0-indexed)
    pub line: u32,
    /// Character offset within the line (0-indexed)
    pub character: u32,
}

impl Position {
    /// Create a new position
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// A half-open span between two positions.
///
/// A range may cross lines; the multi-line matcher produces such ranges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    /// Start position (inclusive)
    pub start: Position,
    /// End position (exclusive)
    pub end: Position,
}

impl Range {
    /// Create a new range
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Range on a single line between two character offsets
    pub fn on_line(line: u32, start: u32, end: u32) -> Self {
        Self {
            start: Position::new(line, start),
            end: Position::new(line, end),
        }
    }

    /// Whether the cursor `pos` touches this range.
    ///
    /// Both ends are inclusive so a cursor placed right after the last
    /// character of a token still selects it.
    pub fn touches(&self, pos: Position) -> bool {
        self.start <= pos && pos <= self.end
    }

    /// Whether the range spans more than one line
    pub fn is_multiline(&self) -> bool {
        self.start.line != self.end.line
    }
}

/// Convert a byte offset inside `line` to a character column.
///
/// Offsets past the end of the line, or inside a multi-byte character,
/// fall back to counting up to the nearest preceding boundary.
pub fn char_column(line: &str, byte_offset: usize) -> u32 {
    let mut offset = byte_offset.min(line.len());
    while !line.is_char_boundary(offset) {
        offset -= 1;
    }
    line[..offset].chars().count() as u32
}

/// Convert a character column to a byte offset inside `line`.
///
/// Columns past the end of the line clamp to the line length.
pub fn byte_offset(line: &str, character: u32) -> usize {
    line.char_indices()
        .nth(character as usize)
        .map_or(line.len(), |(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_ordering() {
        assert!(Position::new(1, 9) < Position::new(2, 0));
        assert!(Position::new(3, 1) < Position::new(3, 2));
        assert_eq!(Position::new(4, 4), Position::new(4, 4));
    }

    #[test]
    fn test_range_touches() {
        let range = Range::on_line(2, 4, 9);
        assert!(range.touches(Position::new(2, 4)));
        assert!(range.touches(Position::new(2, 9)));
        assert!(!range.touches(Position::new(2, 10)));
        assert!(!range.touches(Position::new(1, 5)));
    }

    #[test]
    fn test_multiline_range_touches_middle_line() {
        let range = Range::new(Position::new(1, 10), Position::new(3, 2));
        assert!(range.is_multiline());
        assert!(range.touches(Position::new(2, 0)));
        assert!(range.touches(Position::new(2, 40)));
        assert!(!range.touches(Position::new(3, 3)));
    }

    #[test]
    fn test_char_column_multibyte() {
        let line = "é = f(\"k\")";
        assert_eq!(char_column(line, 0), 0);
        assert_eq!(char_column(line, 2), 1);
        // Inside the two-byte 'é' rounds down
        assert_eq!(char_column(line, 1), 0);
        assert_eq!(char_column(line, 1000), line.chars().count() as u32);
    }

    #[test]
    fn test_byte_offset_roundtrip() {
        let line = "αβ.gamma";
        assert_eq!(byte_offset(line, 2), 4);
        assert_eq!(char_column(line, byte_offset(line, 3)), 3);
        assert_eq!(byte_offset(line, 99), line.len());
    }

    #[test]
    fn test_range_serializes_as_lsp_shape() {
        let json = serde_json::to_value(Range::on_line(0, 1, 2)).unwrap();
        assert_eq!(json["start"]["line"], 0);
        assert_eq!(json["end"]["character"], 2);
    }
}
