//! Positions, ranges and text edits
//!
//! Zero-indexed line/character positions, LSP-shaped.

use serde::{Deserialize, Serialize};

/// Position within a document (0-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }

    /// Convert 0-indexed position to 1-indexed display position
    pub fn to_display(&self) -> (u32, u32) {
        (self.line + 1, self.character + 1)
    }
}

/// Range within a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Convert a single position to a range
    pub fn point(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Sentinel range covering the entire document.
    pub fn full() -> Self {
        Self {
            start: Position::new(0, 0),
            end: Position::new(u32::MAX, 0),
        }
    }

    pub fn is_full(&self) -> bool {
        self.start == Position::new(0, 0) && self.end.line == u32::MAX
    }
}

/// Text edit unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEdit {
    pub range: Range,
    pub new_text: String,
}

impl TextEdit {
    pub fn new(range: Range, new_text: impl Into<String>) -> Self {
        Self {
            range,
            new_text: new_text.into(),
        }
    }

    /// Whole-buffer replacement. The formatting chain always applies its
    /// combined result as a single edit of this shape.
    pub fn replace_all(new_text: impl Into<String>) -> Self {
        Self::new(Range::full(), new_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_range_sentinel() {
        assert!(Range::full().is_full());
        assert!(!Range::point(Position::new(3, 0)).is_full());
    }

    #[test]
    fn test_display_positions() {
        assert_eq!(Position::new(0, 0).to_display(), (1, 1));
        assert_eq!(Position::new(9, 4).to_display(), (10, 5));
    }
}
