//! Rich-text document tree.
//!
//! # Responsibility
//! - Own the ordered block/run tree of one document under edit.
//! - Provide structural primitives (insert/remove/replace blocks, split,
//!   merge and retype runs) used by the command engine.
//!
//! # Invariants
//! - A `Document` always holds at least one block.
//! - A `Block` always holds at least one run. An empty block holds exactly
//!   one empty run as the cursor placeholder.
//! - After any composite mutation, adjacent runs never share a format.
//! - Heading levels are always within `1..=6`.
//! - Offsets count Unicode scalar values, never bytes.

use crate::model::selection::Position;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Lowest supported heading level.
pub const MIN_HEADING_LEVEL: u8 = 1;
/// Highest supported heading level.
pub const MAX_HEADING_LEVEL: u8 = 6;

/// Structural error for out-of-range block or offset access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    BlockIndexOutOfRange { index: usize, len: usize },
    OffsetOutOfRange { offset: usize, len: usize },
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlockIndexOutOfRange { index, len } => {
                write!(f, "block index {index} is out of range (len {len})")
            }
            Self::OffsetOutOfRange { offset, len } => {
                write!(f, "offset {offset} is out of range (block length {len})")
            }
        }
    }
}

impl Error for DocumentError {}

/// Error returned when a toolbar name does not map to a known value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownName {
    pub kind: &'static str,
    pub value: String,
}

impl Display for UnknownName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown {}: `{}`", self.kind, self.value)
    }
}

impl Error for UnknownName {}

/// Heading level guaranteed to be within `1..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    /// Maps a requested level onto a supported one.
    ///
    /// Levels outside `1..=6` fall back to level 1; this is policy, not an
    /// error.
    pub fn coerce(requested: i64) -> Self {
        match u8::try_from(requested) {
            Ok(level) if (MIN_HEADING_LEVEL..=MAX_HEADING_LEVEL).contains(&level) => Self(level),
            _ => Self(MIN_HEADING_LEVEL),
        }
    }

    /// Returns `None` for unsupported levels.
    pub fn new(level: u8) -> Option<Self> {
        (MIN_HEADING_LEVEL..=MAX_HEADING_LEVEL)
            .contains(&level)
            .then_some(Self(level))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

/// Block variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Paragraph,
    Heading(HeadingLevel),
}

/// Horizontal alignment stored as block metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub const ALL: [Alignment; 4] = [Self::Left, Self::Center, Self::Right, Self::Justify];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Justify => "justify",
        }
    }
}

impl FromStr for Alignment {
    type Err = UnknownName;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "center" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            "justify" => Ok(Self::Justify),
            _ => Err(UnknownName {
                kind: "alignment",
                value: value.to_string(),
            }),
        }
    }
}

/// One independently toggleable inline format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatFlag {
    Bold,
    Italic,
    Underline,
    Strikethrough,
}

impl FormatFlag {
    pub const ALL: [FormatFlag; 4] = [
        Self::Bold,
        Self::Italic,
        Self::Underline,
        Self::Strikethrough,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Underline => "underline",
            Self::Strikethrough => "strikethrough",
        }
    }
}

impl FromStr for FormatFlag {
    type Err = UnknownName;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bold" => Ok(Self::Bold),
            "italic" => Ok(Self::Italic),
            "underline" => Ok(Self::Underline),
            "strikethrough" => Ok(Self::Strikethrough),
            _ => Err(UnknownName {
                kind: "format",
                value: value.to_string(),
            }),
        }
    }
}

/// Set of inline format flags carried by one text run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FormatSet {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
}

impl FormatSet {
    pub const PLAIN: FormatSet = FormatSet {
        bold: false,
        italic: false,
        underline: false,
        strikethrough: false,
    };

    pub fn contains(&self, flag: FormatFlag) -> bool {
        match flag {
            FormatFlag::Bold => self.bold,
            FormatFlag::Italic => self.italic,
            FormatFlag::Underline => self.underline,
            FormatFlag::Strikethrough => self.strikethrough,
        }
    }

    pub fn set(&mut self, flag: FormatFlag, enabled: bool) {
        match flag {
            FormatFlag::Bold => self.bold = enabled,
            FormatFlag::Italic => self.italic = enabled,
            FormatFlag::Underline => self.underline = enabled,
            FormatFlag::Strikethrough => self.strikethrough = enabled,
        }
    }

    pub fn toggle(&mut self, flag: FormatFlag) {
        let current = self.contains(flag);
        self.set(flag, !current);
    }

    /// Returns a copy with `flag` enabled.
    pub fn with(mut self, flag: FormatFlag) -> Self {
        self.set(flag, true);
        self
    }

    /// Returns a copy with `flag` flipped.
    pub fn toggled(mut self, flag: FormatFlag) -> Self {
        self.toggle(flag);
        self
    }

    /// Flags shared by both sets.
    pub fn intersect(self, other: FormatSet) -> Self {
        Self {
            bold: self.bold && other.bold,
            italic: self.italic && other.italic,
            underline: self.underline && other.underline,
            strikethrough: self.strikethrough && other.strikethrough,
        }
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::PLAIN
    }
}

/// Contiguous span of text with uniform formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub format: FormatSet,
}

impl TextRun {
    pub fn new(text: impl Into<String>, format: FormatSet) -> Self {
        Self {
            text: text.into(),
            format,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, FormatSet::PLAIN)
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Top-level block owning an ordered run sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    kind: BlockKind,
    align: Alignment,
    runs: Vec<TextRun>,
}

impl Default for Block {
    fn default() -> Self {
        Self::paragraph()
    }
}

impl Block {
    /// Creates an empty block of `kind` holding the placeholder run.
    pub fn new(kind: BlockKind) -> Self {
        Self {
            kind,
            align: Alignment::Left,
            runs: vec![TextRun::plain("")],
        }
    }

    pub fn paragraph() -> Self {
        Self::new(BlockKind::Paragraph)
    }

    pub fn heading(level: HeadingLevel) -> Self {
        Self::new(BlockKind::Heading(level))
    }

    /// Creates a block from arbitrary runs and brings them to normal form.
    pub fn with_runs(kind: BlockKind, runs: Vec<TextRun>) -> Self {
        let mut block = Self {
            kind,
            align: Alignment::Left,
            runs,
        };
        block.normalize();
        block
    }

    pub fn aligned(mut self, align: Alignment) -> Self {
        self.align = align;
        self
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: BlockKind) {
        self.kind = kind;
    }

    pub fn align(&self) -> Alignment {
        self.align
    }

    pub fn set_align(&mut self, align: Alignment) {
        self.align = align;
    }

    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    pub fn char_len(&self) -> usize {
        self.runs.iter().map(TextRun::char_len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|run| run.text.is_empty())
    }

    /// Ensures a run boundary exists at `offset` and returns the index of the
    /// first run starting there (`runs().len()` when `offset` is the end).
    ///
    /// Splitting leaves two adjacent runs with the same format; composite
    /// mutations call [`Block::normalize`] afterwards.
    pub fn split_runs_at(&mut self, offset: usize) -> Result<usize, DocumentError> {
        self.check_offset(offset)?;

        let mut consumed = 0;
        for index in 0..self.runs.len() {
            if offset == consumed {
                return Ok(index);
            }
            let run_len = self.runs[index].char_len();
            if offset < consumed + run_len {
                let split_at = byte_index(&self.runs[index].text, offset - consumed);
                let tail = self.runs[index].text.split_off(split_at);
                let format = self.runs[index].format;
                self.runs.insert(index + 1, TextRun::new(tail, format));
                return Ok(index + 1);
            }
            consumed += run_len;
        }

        Ok(self.runs.len())
    }

    /// Merges same-format neighbours, drops empty runs and restores the
    /// placeholder run when nothing is left.
    pub fn normalize(&mut self) {
        let placeholder = self.runs.first().map(|run| run.format).unwrap_or_default();
        let mut merged: Vec<TextRun> = Vec::with_capacity(self.runs.len());
        for run in self.runs.drain(..) {
            if run.text.is_empty() {
                continue;
            }
            match merged.last_mut() {
                Some(last) if last.format == run.format => last.text.push_str(&run.text),
                _ => merged.push(run),
            }
        }
        if merged.is_empty() {
            merged.push(TextRun::new(String::new(), placeholder));
        }
        self.runs = merged;
    }

    /// Inserts `text` with `format` at `offset`.
    pub fn insert_text(
        &mut self,
        offset: usize,
        text: &str,
        format: FormatSet,
    ) -> Result<(), DocumentError> {
        let index = self.split_runs_at(offset)?;
        self.runs.insert(index, TextRun::new(text, format));
        self.normalize();
        Ok(())
    }

    /// Removes the characters in `start..end`.
    pub fn delete_range(&mut self, start: usize, end: usize) -> Result<(), DocumentError> {
        self.check_span(start, end)?;
        let first = self.split_runs_at(start)?;
        let last = self.split_runs_at(end)?;
        self.runs.drain(first..last);
        self.normalize();
        Ok(())
    }

    /// Flips `flag` on every character in `start..end`, run by run.
    pub fn toggle_format(
        &mut self,
        start: usize,
        end: usize,
        flag: FormatFlag,
    ) -> Result<(), DocumentError> {
        self.check_span(start, end)?;
        let first = self.split_runs_at(start)?;
        let last = self.split_runs_at(end)?;
        for run in &mut self.runs[first..last] {
            run.format.toggle(flag);
        }
        self.normalize();
        Ok(())
    }

    /// Splits this block at `offset`; the tail becomes a new block with the
    /// same kind and alignment.
    pub fn split_off(&mut self, offset: usize) -> Result<Block, DocumentError> {
        let index = self.split_runs_at(offset)?;
        let tail_runs = self.runs.split_off(index);
        self.normalize();
        let mut tail = Block::with_runs(self.kind, tail_runs);
        tail.align = self.align;
        Ok(tail)
    }

    /// Appends the runs of `other`; kind and alignment of `self` win.
    pub fn append(&mut self, other: Block) {
        self.runs.extend(other.runs);
        self.normalize();
    }

    /// Format a character typed at `offset` would inherit: the format of the
    /// character before it, or of the first run at the block start.
    pub fn format_at(&self, offset: usize) -> Result<FormatSet, DocumentError> {
        self.check_offset(offset)?;
        if offset == 0 {
            return Ok(self.runs.first().map(|run| run.format).unwrap_or_default());
        }

        let mut consumed = 0;
        for run in &self.runs {
            let run_len = run.char_len();
            if offset <= consumed + run_len && run_len > 0 {
                return Ok(run.format);
            }
            consumed += run_len;
        }
        Ok(self.runs.last().map(|run| run.format).unwrap_or_default())
    }

    /// Flags shared by every character in `start..end`, or `None` when the
    /// span is empty.
    pub fn shared_format(&self, start: usize, end: usize) -> Result<Option<FormatSet>, DocumentError> {
        self.check_span(start, end)?;
        let mut shared: Option<FormatSet> = None;
        let mut consumed = 0;
        for run in &self.runs {
            let run_start = consumed;
            let run_end = consumed + run.char_len();
            consumed = run_end;
            if run_end <= start || run_start >= end {
                continue;
            }
            shared = Some(match shared {
                Some(acc) => acc.intersect(run.format),
                None => run.format,
            });
        }
        Ok(shared)
    }

    fn check_offset(&self, offset: usize) -> Result<(), DocumentError> {
        let len = self.char_len();
        if offset > len {
            return Err(DocumentError::OffsetOutOfRange { offset, len });
        }
        Ok(())
    }

    fn check_span(&self, start: usize, end: usize) -> Result<(), DocumentError> {
        self.check_offset(end)?;
        if start > end {
            return Err(DocumentError::OffsetOutOfRange {
                offset: start,
                len: end,
            });
        }
        Ok(())
    }
}

/// Root container of one editable document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates a document holding one empty paragraph.
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::paragraph()],
        }
    }

    /// Creates a document from blocks; an empty list yields [`Document::new`].
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        if blocks.is_empty() {
            return Self::new();
        }
        Self { blocks }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn block_mut(&mut self, index: usize) -> Result<&mut Block, DocumentError> {
        let len = self.blocks.len();
        self.blocks
            .get_mut(index)
            .ok_or(DocumentError::BlockIndexOutOfRange { index, len })
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Inserts `block` before `index`; `index == len()` appends.
    pub fn insert_block(&mut self, index: usize, block: Block) -> Result<(), DocumentError> {
        let len = self.blocks.len();
        if index > len {
            return Err(DocumentError::BlockIndexOutOfRange { index, len });
        }
        self.blocks.insert(index, block);
        Ok(())
    }

    /// Removes and returns the block at `index`.
    ///
    /// Removing the only block leaves an empty paragraph behind.
    pub fn remove_block(&mut self, index: usize) -> Result<Block, DocumentError> {
        let len = self.blocks.len();
        if index >= len {
            return Err(DocumentError::BlockIndexOutOfRange { index, len });
        }
        let removed = self.blocks.remove(index);
        if self.blocks.is_empty() {
            self.blocks.push(Block::paragraph());
        }
        Ok(removed)
    }

    /// Replaces the block at `index` and returns the previous one.
    pub fn replace_block(&mut self, index: usize, block: Block) -> Result<Block, DocumentError> {
        let slot = self.block_mut(index)?;
        Ok(std::mem::replace(slot, block))
    }

    /// Checks that `position` addresses a character boundary.
    pub fn check_position(&self, position: Position) -> Result<(), DocumentError> {
        let block = self.block(position.block).ok_or(DocumentError::BlockIndexOutOfRange {
            index: position.block,
            len: self.blocks.len(),
        })?;
        let len = block.char_len();
        if position.offset > len {
            return Err(DocumentError::OffsetOutOfRange {
                offset: position.offset,
                len,
            });
        }
        Ok(())
    }

    /// Position right after the last character of the document.
    pub fn end_position(&self) -> Position {
        let block = self.blocks.len().saturating_sub(1);
        let offset = self.blocks.last().map_or(0, Block::char_len);
        Position::new(block, offset)
    }

    /// Block texts joined with newlines.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn byte_index(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map_or(text.len(), |(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::{
        Alignment, Block, BlockKind, Document, DocumentError, FormatFlag, FormatSet, HeadingLevel,
        TextRun,
    };

    fn bold() -> FormatSet {
        FormatSet::PLAIN.with(FormatFlag::Bold)
    }

    #[test]
    fn heading_level_coerces_out_of_range_to_one() {
        assert_eq!(HeadingLevel::coerce(3).get(), 3);
        assert_eq!(HeadingLevel::coerce(0).get(), 1);
        assert_eq!(HeadingLevel::coerce(7).get(), 1);
        assert_eq!(HeadingLevel::coerce(-4).get(), 1);
        assert!(HeadingLevel::new(9).is_none());
    }

    #[test]
    fn replace_block_swaps_in_place_and_rejects_bad_index() {
        let mut document = Document::from_blocks(vec![
            Block::with_runs(BlockKind::Paragraph, vec![TextRun::plain("lede")]),
            Block::with_runs(BlockKind::Paragraph, vec![TextRun::plain("body")]),
        ]);

        let previous = document
            .replace_block(0, Block::heading(HeadingLevel::coerce(2)))
            .unwrap();
        assert_eq!(previous.text(), "lede");
        assert_eq!(document.len(), 2);
        assert_eq!(
            document.blocks()[0].kind(),
            BlockKind::Heading(HeadingLevel::coerce(2))
        );
        assert_eq!(document.blocks()[1].text(), "body");

        let before = document.clone();
        let err = document.replace_block(2, Block::paragraph()).unwrap_err();
        assert_eq!(err, DocumentError::BlockIndexOutOfRange { index: 2, len: 2 });
        assert_eq!(document, before);
    }

    #[test]
    fn normalize_merges_equal_neighbours_and_keeps_placeholder() {
        let block = Block::with_runs(
            BlockKind::Paragraph,
            vec![
                TextRun::plain("ab"),
                TextRun::plain(""),
                TextRun::plain("cd"),
                TextRun::new("ef", bold()),
            ],
        );
        assert_eq!(block.runs().len(), 2);
        assert_eq!(block.runs()[0].text, "abcd");

        let empty = Block::with_runs(BlockKind::Paragraph, Vec::new());
        assert_eq!(empty.runs().len(), 1);
        assert!(empty.is_empty());
    }

    #[test]
    fn split_runs_at_counts_characters_not_bytes() {
        let mut block = Block::with_runs(BlockKind::Paragraph, vec![TextRun::plain("héllo")]);
        let index = block.split_runs_at(2).unwrap();
        assert_eq!(index, 1);
        assert_eq!(block.runs()[0].text, "hé");
        assert_eq!(block.runs()[1].text, "llo");
    }

    #[test]
    fn toggle_format_affects_exactly_the_span() {
        let mut block = Block::with_runs(BlockKind::Paragraph, vec![TextRun::plain("hello world")]);
        block.toggle_format(6, 11, FormatFlag::Bold).unwrap();
        assert_eq!(block.runs().len(), 2);
        assert_eq!(block.runs()[0].text, "hello ");
        assert!(!block.runs()[0].format.bold);
        assert_eq!(block.runs()[1].text, "world");
        assert!(block.runs()[1].format.bold);
    }

    #[test]
    fn delete_range_rejects_out_of_range_without_mutation() {
        let mut block = Block::with_runs(BlockKind::Paragraph, vec![TextRun::plain("abc")]);
        assert!(block.delete_range(1, 9).is_err());
        assert_eq!(block.text(), "abc");
        block.delete_range(0, 3).unwrap();
        assert!(block.is_empty());
        assert_eq!(block.runs().len(), 1);
    }

    #[test]
    fn split_off_keeps_kind_and_alignment() {
        let mut block = Block::with_runs(
            BlockKind::Heading(HeadingLevel::coerce(2)),
            vec![TextRun::plain("headline")],
        )
        .aligned(Alignment::Center);
        let tail = block.split_off(4).unwrap();
        assert_eq!(block.text(), "head");
        assert_eq!(tail.text(), "line");
        assert_eq!(tail.kind(), block.kind());
        assert_eq!(tail.align(), Alignment::Center);
    }

    #[test]
    fn format_at_reads_character_before_offset() {
        let block = Block::with_runs(
            BlockKind::Paragraph,
            vec![TextRun::new("ab", bold()), TextRun::plain("cd")],
        );
        assert!(block.format_at(0).unwrap().bold);
        assert!(block.format_at(2).unwrap().bold);
        assert!(!block.format_at(3).unwrap().bold);
    }

    #[test]
    fn shared_format_intersects_spanned_runs() {
        let block = Block::with_runs(
            BlockKind::Paragraph,
            vec![TextRun::new("ab", bold()), TextRun::plain("cd")],
        );
        assert!(block.shared_format(0, 2).unwrap().unwrap().bold);
        assert!(!block.shared_format(0, 3).unwrap().unwrap().bold);
        assert_eq!(block.shared_format(2, 2).unwrap(), None);
    }
}
