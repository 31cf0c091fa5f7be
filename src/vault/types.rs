//! Core position types shared by the vault engine.
//!
//! - `MyRange`: a wrapper around the LSP `Range` with rope-based constructors
//! - `Rangeable`: containment checks for anything carrying a `MyRange`

use std::ops::{Deref, Range};

use ropey::Rope;
use serde::{Deserialize, Serialize};
use tower_lsp::lsp_types::Position;

/// A wrapper around `tower_lsp::lsp_types::Range` with additional utilities.
///
/// Positions are line/character pairs where `character` counts chars, the same
/// unit `ropey` uses.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct MyRange(pub tower_lsp::lsp_types::Range);

impl MyRange {
    /// Creates a `MyRange` from a byte offset range using rope for position calculation.
    pub fn from_range(rope: &Rope, range: Range<usize>) -> MyRange {
        // convert from byte offset to char offset
        let char_start = rope.byte_to_char(range.start);
        let char_end = rope.byte_to_char(range.end);

        MyRange::from_char_range(rope, char_start..char_end)
    }

    /// Creates a `MyRange` from a char offset range.
    pub fn from_char_range(rope: &Rope, range: Range<usize>) -> MyRange {
        tower_lsp::lsp_types::Range {
            start: char_position(rope, range.start),
            end: char_position(rope, range.end),
        }
        .into()
    }
}

fn char_position(rope: &Rope, char_idx: usize) -> Position {
    let line = rope.char_to_line(char_idx);
    let character = char_idx - rope.line_to_char(line);

    Position {
        line: line as u32,
        character: character as u32,
    }
}

impl std::hash::Hash for MyRange {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.start.line.hash(state);
        self.0.start.character.hash(state);
        self.0.end.line.hash(state);
        self.0.end.character.hash(state);
    }
}

impl Deref for MyRange {
    type Target = tower_lsp::lsp_types::Range;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<tower_lsp::lsp_types::Range> for MyRange {
    fn from(range: tower_lsp::lsp_types::Range) -> Self {
        MyRange(range)
    }
}

/// Trait for types that have a range (position span in the document).
pub trait Rangeable {
    fn range(&self) -> &MyRange;

    /// True when `position` lies on one of the characters covered by the range.
    /// The end position is exclusive.
    fn includes_position(&self, position: Position) -> bool {
        let range = self.range();
        (range.start.line < position.line
            || (range.start.line == position.line && range.start.character <= position.character))
            && (range.end.line > position.line
                || (range.end.line == position.line && range.end.character > position.character))
    }
}
