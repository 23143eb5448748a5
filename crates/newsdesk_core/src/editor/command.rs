//! Closed command set accepted by the editor session.

use crate::editor::history::{HistoryDirection, NoHistoryAvailable};
use crate::editor::tracker::FormatSnapshot;
use crate::exchange::MalformedDocument;
use crate::model::document::{Alignment, DocumentError, FormatFlag};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Requested block type; heading levels are coerced on application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Paragraph,
    Heading(i64),
}

/// Discrete mutation dispatched from one user interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ToggleFormat(FormatFlag),
    SetBlockType(BlockType),
    SetAlignment(Alignment),
    Undo,
    Redo,
    /// Types text at the selection; `\n` starts a new block.
    InsertText(String),
    DeleteBackward,
    /// Splits the block at the selection.
    InsertParagraph,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::ToggleFormat(_) => CommandKind::ToggleFormat,
            Self::SetBlockType(_) => CommandKind::SetBlockType,
            Self::SetAlignment(_) => CommandKind::SetAlignment,
            Self::Undo => CommandKind::Undo,
            Self::Redo => CommandKind::Redo,
            Self::InsertText(_) => CommandKind::InsertText,
            Self::DeleteBackward => CommandKind::DeleteBackward,
            Self::InsertParagraph => CommandKind::InsertParagraph,
        }
    }
}

/// Payload-free command tag used in notifications and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    ToggleFormat,
    SetBlockType,
    SetAlignment,
    Undo,
    Redo,
    InsertText,
    DeleteBackward,
    InsertParagraph,
}

impl CommandKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ToggleFormat => "toggle_format",
            Self::SetBlockType => "set_block_type",
            Self::SetAlignment => "set_alignment",
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::InsertText => "insert_text",
            Self::DeleteBackward => "delete_backward",
            Self::InsertParagraph => "insert_paragraph",
        }
    }
}

/// What triggered a listener notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateCause {
    Command(CommandKind),
    SelectionChange,
}

/// State-change notification delivered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorUpdate {
    /// Sequence number of the current history entry.
    pub seq: u64,
    pub cause: UpdateCause,
    pub formats: FormatSnapshot,
    pub can_undo: bool,
    pub can_redo: bool,
}

/// Rejection of a whole command; the document is left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The command needs a selection and none is active.
    NoSelection,
    /// Selection does not address the current document.
    InvalidSelection(DocumentError),
    /// Undo/redo at a history boundary.
    NoHistoryAvailable(HistoryDirection),
    /// `InsertText` with an empty string.
    EmptyInput,
    /// `DeleteBackward` at the very start of the document.
    NothingToDelete,
    /// A history snapshot failed to decode.
    CorruptHistory(MalformedDocument),
}

impl CommandError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoSelection => "no_selection",
            Self::InvalidSelection(_) => "invalid_selection",
            Self::NoHistoryAvailable(_) => "no_history_available",
            Self::EmptyInput => "empty_input",
            Self::NothingToDelete => "nothing_to_delete",
            Self::CorruptHistory(_) => "malformed_document",
        }
    }
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSelection => write!(f, "no active selection"),
            Self::InvalidSelection(err) => write!(f, "invalid selection: {err}"),
            Self::NoHistoryAvailable(direction) => write!(
                f,
                "{}",
                NoHistoryAvailable {
                    direction: *direction
                }
            ),
            Self::EmptyInput => write!(f, "nothing to insert"),
            Self::NothingToDelete => write!(f, "nothing to delete"),
            Self::CorruptHistory(err) => write!(f, "history snapshot unreadable: {err}"),
        }
    }
}

impl Error for CommandError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidSelection(err) => Some(err),
            Self::CorruptHistory(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DocumentError> for CommandError {
    fn from(value: DocumentError) -> Self {
        Self::InvalidSelection(value)
    }
}

impl From<NoHistoryAvailable> for CommandError {
    fn from(value: NoHistoryAvailable) -> Self {
        Self::NoHistoryAvailable(value.direction)
    }
}

impl From<MalformedDocument> for CommandError {
    fn from(value: MalformedDocument) -> Self {
        Self::CorruptHistory(value)
    }
}
