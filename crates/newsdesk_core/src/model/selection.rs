//! Cursor and range references into a document.
//!
//! Selections are ephemeral: they are never persisted and are validated
//! against the document by the editor session before use.

use std::ops::RangeInclusive;

/// Character boundary inside one block.
///
/// Ordering is document order: by block, then by offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub block: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(block: usize, offset: usize) -> Self {
        Self { block, offset }
    }
}

/// Anchor/focus pair; collapsed when both are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Selection {
    pub anchor: Position,
    pub focus: Position,
}

impl Selection {
    pub fn caret(position: Position) -> Self {
        Self {
            anchor: position,
            focus: position,
        }
    }

    pub fn range(anchor: Position, focus: Position) -> Self {
        Self { anchor, focus }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// Earlier of anchor and focus.
    pub fn start(&self) -> Position {
        self.anchor.min(self.focus)
    }

    /// Later of anchor and focus.
    pub fn end(&self) -> Position {
        self.anchor.max(self.focus)
    }

    /// Indices of every block touched by the selection.
    pub fn block_span(&self) -> RangeInclusive<usize> {
        self.start().block..=self.end().block
    }
}
