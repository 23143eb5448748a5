//! Toolbar format state derived from the current selection.
//!
//! # Invariants
//! - Purely derived: never mutates the document.
//! - On a range, a flag reads active only if every spanned character
//!   carries it.
//! - Without a selection every flag reads inactive.

use crate::model::document::{Document, FormatFlag, FormatSet};
use crate::model::selection::{Position, Selection};

/// Active-format snapshot consumed by the UI layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatSnapshot {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
}

impl FormatSnapshot {
    pub fn is_active(&self, flag: FormatFlag) -> bool {
        match flag {
            FormatFlag::Bold => self.bold,
            FormatFlag::Italic => self.italic,
            FormatFlag::Underline => self.underline,
            FormatFlag::Strikethrough => self.strikethrough,
        }
    }
}

impl From<FormatSet> for FormatSnapshot {
    fn from(value: FormatSet) -> Self {
        Self {
            bold: value.bold,
            italic: value.italic,
            underline: value.underline,
            strikethrough: value.strikethrough,
        }
    }
}

/// Holds the last computed snapshot.
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    snapshot: FormatSnapshot,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> FormatSnapshot {
        self.snapshot
    }

    /// Recomputes the snapshot; returns `true` when it changed.
    pub fn refresh(
        &mut self,
        document: &Document,
        selection: Option<&Selection>,
        pending: Option<FormatSet>,
    ) -> bool {
        let next = active_formats(document, selection, pending);
        let changed = next != self.snapshot;
        self.snapshot = next;
        changed
    }
}

/// Computes the active formats for `selection`.
///
/// A collapsed cursor reports `pending` when set, else the format the next
/// typed character would inherit. A range spanning no characters reads like
/// a cursor at its start.
pub fn active_formats(
    document: &Document,
    selection: Option<&Selection>,
    pending: Option<FormatSet>,
) -> FormatSnapshot {
    let Some(selection) = selection else {
        return FormatSnapshot::default();
    };

    if selection.is_collapsed() {
        if let Some(format) = pending {
            return format.into();
        }
        return format_at(document, selection.focus).into();
    }

    match shared_format(document, selection) {
        Some(format) => format.into(),
        None => format_at(document, selection.start()).into(),
    }
}

fn format_at(document: &Document, position: Position) -> FormatSet {
    document
        .block(position.block)
        .and_then(|block| block.format_at(position.offset).ok())
        .unwrap_or_default()
}

fn shared_format(document: &Document, selection: &Selection) -> Option<FormatSet> {
    let start = selection.start();
    let end = selection.end();
    let mut shared: Option<FormatSet> = None;

    for index in selection.block_span() {
        let block = document.block(index)?;
        let from = if index == start.block { start.offset } else { 0 };
        let to = if index == end.block {
            end.offset
        } else {
            block.char_len()
        };
        if let Some(format) = block.shared_format(from, to).ok().flatten() {
            shared = Some(match shared {
                Some(acc) => acc.intersect(format),
                None => format,
            });
        }
    }

    shared
}
