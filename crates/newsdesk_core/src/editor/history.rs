//! Bounded linear undo/redo history.
//!
//! # Invariants
//! - Entries before the cursor are undo-able, entries after it redo-able.
//! - `push` discards the redo-able tail.
//! - When capacity is exceeded the oldest entry is evicted and the cursor
//!   shifts with it.
//! - Sequence numbers strictly increase for the life of the stack.
//! - Entries are immutable once pushed.

use crate::exchange::ExchangeForm;
use crate::model::selection::Selection;
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default number of retained entries.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;
/// Smallest capacity that still allows one undo step.
pub const MIN_HISTORY_CAPACITY: usize = 2;
/// Largest accepted capacity; larger requests are lowered to this.
pub const MAX_HISTORY_CAPACITY: usize = 10_000;

/// Direction of a history step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDirection {
    Undo,
    Redo,
}

/// Expected boundary condition: no entry in the requested direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoHistoryAvailable {
    pub direction: HistoryDirection,
}

impl Display for NoHistoryAvailable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.direction {
            HistoryDirection::Undo => write!(f, "nothing to undo"),
            HistoryDirection::Redo => write!(f, "nothing to redo"),
        }
    }
}

impl Error for NoHistoryAvailable {}

/// Snapshot of the serialized document after one command.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    seq: u64,
    snapshot: ExchangeForm,
    selection: Option<Selection>,
}

impl HistoryEntry {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn snapshot(&self) -> &ExchangeForm {
        &self.snapshot
    }

    /// Selection at the time the snapshot was taken.
    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }
}

#[derive(Debug, Clone)]
pub struct HistoryStack {
    entries: VecDeque<HistoryEntry>,
    cursor: usize,
    capacity: usize,
    next_seq: u64,
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStack {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Creates an empty stack with `capacity` clamped to
    /// `MIN_HISTORY_CAPACITY..=MAX_HISTORY_CAPACITY`.
    ///
    /// Storage grows with use; nothing is reserved up front.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.clamp(MIN_HISTORY_CAPACITY, MAX_HISTORY_CAPACITY);
        Self {
            entries: VecDeque::new(),
            cursor: 0,
            capacity,
            next_seq: 1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends a snapshot at the cursor and returns its sequence number.
    pub fn push(&mut self, snapshot: ExchangeForm, selection: Option<Selection>) -> u64 {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push_back(HistoryEntry {
            seq,
            snapshot,
            selection,
        });
        self.cursor = self.entries.len() - 1;

        while self.entries.len() > self.capacity {
            self.entries.pop_front();
            self.cursor -= 1;
        }

        seq
    }

    /// Entry the cursor points at.
    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Entry `undo` would return, without moving the cursor.
    pub fn peek_undo(&self) -> Option<&HistoryEntry> {
        if self.can_undo() {
            self.entries.get(self.cursor - 1)
        } else {
            None
        }
    }

    /// Entry `redo` would return, without moving the cursor.
    pub fn peek_redo(&self) -> Option<&HistoryEntry> {
        if self.can_redo() {
            self.entries.get(self.cursor + 1)
        } else {
            None
        }
    }

    /// Moves the cursor back one entry and returns it.
    pub fn undo(&mut self) -> Result<&HistoryEntry, NoHistoryAvailable> {
        if !self.can_undo() {
            return Err(NoHistoryAvailable {
                direction: HistoryDirection::Undo,
            });
        }
        self.cursor -= 1;
        Ok(&self.entries[self.cursor])
    }

    /// Moves the cursor forward one entry and returns it.
    pub fn redo(&mut self) -> Result<&HistoryEntry, NoHistoryAvailable> {
        if !self.can_redo() {
            return Err(NoHistoryAvailable {
                direction: HistoryDirection::Redo,
            });
        }
        self.cursor += 1;
        Ok(&self.entries[self.cursor])
    }
}
