//! Command engine over one live document.
//!
//! # Responsibility
//! - Apply commands atomically against the current selection.
//! - Record one history entry per successful edit.
//! - Keep the toolbar snapshot current and notify subscribers.
//!
//! # Invariants
//! - Every edit runs against a working copy; the live document is replaced
//!   only after the whole command succeeded.
//! - Listeners fire exactly once per successful command, after the state
//!   (document, selection, history, snapshot) is fully updated.
//! - The initial document is the first history entry and is not undo-able.

use crate::editor::command::{BlockType, Command, CommandError, EditorUpdate, UpdateCause};
use crate::editor::history::{HistoryDirection, HistoryStack, NoHistoryAvailable};
use crate::editor::tracker::{FormatSnapshot, SelectionTracker};
use crate::exchange::{self, ExchangeForm, MalformedDocument};
use crate::model::document::{
    Alignment, Block, BlockKind, Document, DocumentError, FormatFlag, FormatSet, HeadingLevel,
};
use crate::model::selection::{Position, Selection};
use log::{debug, warn};

/// Handle returned by [`EditorSession::subscribe`].
pub type SubscriptionId = u64;

type Listener = Box<dyn FnMut(&EditorUpdate) + Send>;

/// One authoring session: live document, selection, history, listeners.
pub struct EditorSession {
    document: Document,
    selection: Option<Selection>,
    pending_format: Option<FormatSet>,
    history: HistoryStack,
    tracker: SelectionTracker,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: SubscriptionId,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorSession {
    /// Starts a session on an empty document with default history capacity.
    pub fn new() -> Self {
        Self::from_document(Document::new(), HistoryStack::new())
    }

    /// Starts a session on an empty document.
    pub fn with_capacity(history_capacity: usize) -> Self {
        Self::from_document(Document::new(), HistoryStack::with_capacity(history_capacity))
    }

    /// Starts a session on previously saved content.
    pub fn from_exchange(
        form: &ExchangeForm,
        history_capacity: usize,
    ) -> Result<Self, MalformedDocument> {
        let document = exchange::deserialize(form)?;
        Ok(Self::from_document(
            document,
            HistoryStack::with_capacity(history_capacity),
        ))
    }

    fn from_document(document: Document, mut history: HistoryStack) -> Self {
        history.push(exchange::serialize(&document), None);
        Self {
            document,
            selection: None,
            pending_format: None,
            history,
            tracker: SelectionTracker::new(),
            listeners: Vec::new(),
            next_subscription: 1,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn formats(&self) -> FormatSnapshot {
        self.tracker.snapshot()
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Serializes the live document into an immutable value for saving.
    pub fn snapshot(&self) -> ExchangeForm {
        exchange::serialize(&self.document)
    }

    /// Registers a listener called synchronously after every update.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&EditorUpdate) + Send + 'static,
    ) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener; returns `false` for unknown ids.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(current, _)| *current != id);
        self.listeners.len() != before
    }

    /// Moves the selection; clears any pending cursor format.
    ///
    /// # Errors
    /// - `InvalidSelection` when either end is outside the document; the
    ///   previous selection stays.
    pub fn set_selection(&mut self, selection: Selection) -> Result<EditorUpdate, CommandError> {
        self.document.check_position(selection.anchor)?;
        self.document.check_position(selection.focus)?;
        self.selection = Some(selection);
        self.pending_format = None;
        Ok(self.publish(UpdateCause::SelectionChange))
    }

    /// Places a collapsed cursor.
    pub fn set_caret(&mut self, position: Position) -> Result<EditorUpdate, CommandError> {
        self.set_selection(Selection::caret(position))
    }

    /// Selects the whole document.
    pub fn select_all(&mut self) -> EditorUpdate {
        self.selection = Some(Selection::range(
            Position::new(0, 0),
            self.document.end_position(),
        ));
        self.pending_format = None;
        self.publish(UpdateCause::SelectionChange)
    }

    /// Drops the selection (editor lost focus).
    pub fn clear_selection(&mut self) -> EditorUpdate {
        self.selection = None;
        self.pending_format = None;
        self.publish(UpdateCause::SelectionChange)
    }

    /// Applies one command.
    ///
    /// # Errors
    /// The command is rejected as a whole and nothing changes:
    /// - `NoSelection` for edits without an active selection.
    /// - `NoHistoryAvailable` for undo/redo at a boundary.
    /// - `EmptyInput` / `NothingToDelete` for no-op text edits.
    pub fn apply(&mut self, command: Command) -> Result<EditorUpdate, CommandError> {
        let kind = command.kind();
        let outcome = match command {
            Command::Undo => self.step_history(HistoryDirection::Undo),
            Command::Redo => self.step_history(HistoryDirection::Redo),
            Command::ToggleFormat(flag) => {
                self.edit(|document, selection, pending| {
                    toggle_format(document, selection, pending, flag)
                })
            }
            Command::SetBlockType(block_type) => {
                self.edit(|document, selection, _| set_block_type(document, selection, block_type))
            }
            Command::SetAlignment(align) => {
                self.edit(|document, selection, _| set_alignment(document, selection, align))
            }
            Command::InsertText(text) => self.edit(|document, selection, pending| {
                insert_text(document, selection, pending, &text)
            }),
            Command::DeleteBackward => self.edit(|document, selection, pending| {
                *pending = None;
                delete_backward(document, selection)
            }),
            Command::InsertParagraph => self.edit(|document, selection, _| {
                let cursor = delete_selection(document, selection)?;
                Ok(Selection::caret(split_block(document, cursor)?))
            }),
        };

        if let Err(err) = outcome {
            match err {
                CommandError::NoHistoryAvailable(_) => debug!(
                    "event=command_apply module=editor status=noop command={} error_code={}",
                    kind.as_str(),
                    err.code()
                ),
                _ => warn!(
                    "event=command_apply module=editor status=error command={} error_code={} error={}",
                    kind.as_str(),
                    err.code(),
                    err
                ),
            }
            return Err(err);
        }

        let update = self.publish(UpdateCause::Command(kind));
        debug!(
            "event=command_apply module=editor status=ok command={} seq={} can_undo={} can_redo={}",
            kind.as_str(),
            update.seq,
            update.can_undo,
            update.can_redo
        );
        Ok(update)
    }

    fn edit(
        &mut self,
        op: impl FnOnce(&mut Document, Selection, &mut Option<FormatSet>) -> Result<Selection, CommandError>,
    ) -> Result<(), CommandError> {
        let selection = self.selection.ok_or(CommandError::NoSelection)?;
        let mut working = self.document.clone();
        let mut pending = self.pending_format;
        let next_selection = op(&mut working, selection, &mut pending)?;

        self.document = working;
        self.selection = Some(next_selection);
        self.pending_format = pending;
        self.history
            .push(exchange::serialize(&self.document), self.selection);
        Ok(())
    }

    fn step_history(&mut self, direction: HistoryDirection) -> Result<(), CommandError> {
        let entry = match direction {
            HistoryDirection::Undo => self.history.peek_undo(),
            HistoryDirection::Redo => self.history.peek_redo(),
        }
        .ok_or(NoHistoryAvailable { direction })?;

        let document = exchange::deserialize(entry.snapshot())?;
        let selection = entry.selection().filter(|selection| {
            document.check_position(selection.anchor).is_ok()
                && document.check_position(selection.focus).is_ok()
        });

        match direction {
            HistoryDirection::Undo => self.history.undo()?,
            HistoryDirection::Redo => self.history.redo()?,
        };

        self.document = document;
        self.selection = selection;
        self.pending_format = None;
        Ok(())
    }

    fn publish(&mut self, cause: UpdateCause) -> EditorUpdate {
        self.tracker
            .refresh(&self.document, self.selection.as_ref(), self.pending_format);
        let update = EditorUpdate {
            seq: self.history.current().map_or(0, |entry| entry.seq()),
            cause,
            formats: self.tracker.snapshot(),
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        };
        for (_, listener) in &mut self.listeners {
            listener(&update);
        }
        update
    }
}

fn toggle_format(
    document: &mut Document,
    selection: Selection,
    pending: &mut Option<FormatSet>,
    flag: FormatFlag,
) -> Result<Selection, CommandError> {
    if selection.is_collapsed() {
        let base = match *pending {
            Some(format) => format,
            None => document
                .block_mut(selection.focus.block)?
                .format_at(selection.focus.offset)?,
        };
        *pending = Some(base.toggled(flag));
        return Ok(selection);
    }

    for_each_span(document, selection, |block, from, to| {
        block.toggle_format(from, to, flag)
    })?;
    Ok(selection)
}

fn set_block_type(
    document: &mut Document,
    selection: Selection,
    block_type: BlockType,
) -> Result<Selection, CommandError> {
    let kind = match block_type {
        BlockType::Paragraph => BlockKind::Paragraph,
        BlockType::Heading(level) => BlockKind::Heading(HeadingLevel::coerce(level)),
    };
    for index in selection.block_span() {
        document.block_mut(index)?.set_kind(kind);
    }
    Ok(selection)
}

fn set_alignment(
    document: &mut Document,
    selection: Selection,
    align: Alignment,
) -> Result<Selection, CommandError> {
    for index in selection.block_span() {
        document.block_mut(index)?.set_align(align);
    }
    Ok(selection)
}

fn insert_text(
    document: &mut Document,
    selection: Selection,
    pending: &mut Option<FormatSet>,
    text: &str,
) -> Result<Selection, CommandError> {
    if text.is_empty() {
        return Err(CommandError::EmptyInput);
    }

    let mut cursor = delete_selection(document, selection)?;
    let format = match pending.take() {
        Some(format) => format,
        None => document
            .block_mut(cursor.block)?
            .format_at(cursor.offset)?,
    };

    let normalized = text.replace("\r\n", "\n");
    for (index, segment) in normalized.split('\n').enumerate() {
        if index > 0 {
            cursor = split_block(document, cursor)?;
        }
        if !segment.is_empty() {
            document
                .block_mut(cursor.block)?
                .insert_text(cursor.offset, segment, format)?;
            cursor.offset += segment.chars().count();
        }
    }

    Ok(Selection::caret(cursor))
}

fn delete_backward(document: &mut Document, selection: Selection) -> Result<Selection, CommandError> {
    if !selection.is_collapsed() {
        return Ok(Selection::caret(delete_selection(document, selection)?));
    }

    let at = selection.focus;
    if at.offset > 0 {
        document
            .block_mut(at.block)?
            .delete_range(at.offset - 1, at.offset)?;
        return Ok(Selection::caret(Position::new(at.block, at.offset - 1)));
    }
    if at.block == 0 {
        return Err(CommandError::NothingToDelete);
    }

    let current = document.remove_block(at.block)?;
    let previous = document.block_mut(at.block - 1)?;
    let joint = previous.char_len();
    previous.append(current);
    Ok(Selection::caret(Position::new(at.block - 1, joint)))
}

/// Removes the selected text and returns the collapsed start position.
fn delete_selection(document: &mut Document, selection: Selection) -> Result<Position, DocumentError> {
    let start = selection.start();
    let end = selection.end();
    if start == end {
        return Ok(start);
    }

    if start.block == end.block {
        document
            .block_mut(start.block)?
            .delete_range(start.offset, end.offset)?;
        return Ok(start);
    }

    let tail = document.block_mut(end.block)?.split_off(end.offset)?;
    for index in (start.block + 1..=end.block).rev() {
        document.remove_block(index)?;
    }
    let head = document.block_mut(start.block)?;
    let len = head.char_len();
    head.delete_range(start.offset, len)?;
    head.append(tail);
    Ok(start)
}

/// Splits the block at `at`; splitting at the end starts a paragraph.
fn split_block(document: &mut Document, at: Position) -> Result<Position, DocumentError> {
    let block = document.block_mut(at.block)?;
    let at_end = at.offset == block.char_len();
    let mut tail = block.split_off(at.offset)?;
    if at_end {
        tail.set_kind(BlockKind::Paragraph);
    }
    document.insert_block(at.block + 1, tail)?;
    Ok(Position::new(at.block + 1, 0))
}

fn for_each_span(
    document: &mut Document,
    selection: Selection,
    mut op: impl FnMut(&mut Block, usize, usize) -> Result<(), DocumentError>,
) -> Result<(), DocumentError> {
    let start = selection.start();
    let end = selection.end();
    for index in selection.block_span() {
        let block = document.block_mut(index)?;
        let from = if index == start.block { start.offset } else { 0 };
        let to = if index == end.block {
            end.offset
        } else {
            block.char_len()
        };
        op(block, from, to)?;
    }
    Ok(())
}
