use newsdesk_core::exchange::{self, ExchangeForm};
use newsdesk_core::editor::history::MAX_HISTORY_CAPACITY;
use newsdesk_core::{
    Alignment, Block, BlockKind, BlockType, Command, CommandError, CommandKind, Document,
    EditorSession, EditorUpdate, FormatFlag, FormatSet, HeadingLevel, HistoryDirection, Position,
    Selection, TextRun, UpdateCause,
};
use std::sync::{Arc, Mutex};

fn session_with(document: Document) -> EditorSession {
    EditorSession::from_exchange(&exchange::serialize(&document), 100).unwrap()
}

fn hello_world_with_bold_hello() -> Document {
    Document::from_blocks(vec![Block::with_runs(
        BlockKind::Paragraph,
        vec![
            TextRun::new("Hello", FormatSet::PLAIN.with(FormatFlag::Bold)),
            TextRun::plain(" world"),
        ],
    )])
}

fn type_text(session: &mut EditorSession, text: &str) {
    session.apply(Command::InsertText(text.to_string())).unwrap();
}

#[test]
fn toggle_without_selection_is_rejected_without_side_effects() {
    let mut session = session_with(hello_world_with_bold_hello());
    let before = session.document().clone();
    let calls = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&calls);
    session.subscribe(move |_| *counter.lock().unwrap() += 1);

    let err = session
        .apply(Command::ToggleFormat(FormatFlag::Bold))
        .unwrap_err();

    assert_eq!(err, CommandError::NoSelection);
    assert_eq!(err.code(), "no_selection");
    assert_eq!(session.document(), &before);
    assert_eq!(session.history().len(), 1);
    assert_eq!(*calls.lock().unwrap(), 0);
}

#[test]
fn heading_level_out_of_range_is_coerced_to_one() {
    let mut session = session_with(hello_world_with_bold_hello());
    session.set_caret(Position::new(0, 2)).unwrap();

    session
        .apply(Command::SetBlockType(BlockType::Heading(9)))
        .unwrap();
    assert_eq!(
        session.document().blocks()[0].kind(),
        BlockKind::Heading(HeadingLevel::new(1).unwrap())
    );

    session
        .apply(Command::SetBlockType(BlockType::Heading(3)))
        .unwrap();
    assert_eq!(
        session.document().blocks()[0].kind(),
        BlockKind::Heading(HeadingLevel::new(3).unwrap())
    );

    session
        .apply(Command::SetBlockType(BlockType::Heading(0)))
        .unwrap();
    assert_eq!(
        session.document().blocks()[0].kind(),
        BlockKind::Heading(HeadingLevel::new(1).unwrap())
    );

    session
        .apply(Command::SetBlockType(BlockType::Paragraph))
        .unwrap();
    assert_eq!(session.document().blocks()[0].kind(), BlockKind::Paragraph);
}

#[test]
fn partial_bold_range_reads_inactive() {
    let mut session = session_with(hello_world_with_bold_hello());

    session.set_caret(Position::new(0, 3)).unwrap();
    assert!(session.formats().bold);

    let update = session
        .set_selection(Selection::range(Position::new(0, 0), Position::new(0, 11)))
        .unwrap();
    assert_eq!(update.cause, UpdateCause::SelectionChange);
    assert!(!update.formats.is_active(FormatFlag::Bold));
    assert!(!session.formats().bold);

    session
        .set_selection(Selection::range(Position::new(0, 0), Position::new(0, 5)))
        .unwrap();
    assert!(session.formats().bold);
}

#[test]
fn toggle_on_range_affects_exactly_the_spanned_text() {
    let mut session = session_with(Document::from_blocks(vec![Block::with_runs(
        BlockKind::Paragraph,
        vec![TextRun::plain("Breaking news")],
    )]));
    session
        .set_selection(Selection::range(Position::new(0, 0), Position::new(0, 8)))
        .unwrap();

    let update = session
        .apply(Command::ToggleFormat(FormatFlag::Bold))
        .unwrap();

    assert!(update.formats.bold);
    assert_eq!(update.cause, UpdateCause::Command(CommandKind::ToggleFormat));
    let runs = session.document().blocks()[0].runs();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].text, "Breaking");
    assert!(runs[0].format.bold);
    assert_eq!(runs[1].text, " news");
    assert!(!runs[1].format.bold);
}

#[test]
fn toggle_twice_restores_original_flags() {
    let original = hello_world_with_bold_hello();
    let mut session = session_with(original.clone());
    session
        .set_selection(Selection::range(Position::new(0, 2), Position::new(0, 8)))
        .unwrap();

    session
        .apply(Command::ToggleFormat(FormatFlag::Bold))
        .unwrap();
    assert_ne!(session.document(), &original);
    session
        .apply(Command::ToggleFormat(FormatFlag::Bold))
        .unwrap();

    assert_eq!(session.document(), &original);
}

#[test]
fn collapsed_toggle_applies_to_next_typed_text() {
    let mut session = EditorSession::new();
    session.set_caret(Position::new(0, 0)).unwrap();
    type_text(&mut session, "Plain ");

    let update = session
        .apply(Command::ToggleFormat(FormatFlag::Italic))
        .unwrap();
    assert!(update.formats.italic);
    assert!(update.can_undo);

    type_text(&mut session, "slanted");
    let runs = session.document().blocks()[0].runs();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[1].text, "slanted");
    assert!(runs[1].format.italic);
    assert!(session.formats().italic);
}

#[test]
fn alignment_applies_to_every_spanned_block() {
    let mut session = EditorSession::new();
    session.set_caret(Position::new(0, 0)).unwrap();
    type_text(&mut session, "one\ntwo\nthree");
    assert_eq!(session.document().len(), 3);

    session
        .set_selection(Selection::range(Position::new(2, 1), Position::new(1, 1)))
        .unwrap();
    session
        .apply(Command::SetAlignment(Alignment::Center))
        .unwrap();

    let aligns: Vec<Alignment> = session
        .document()
        .blocks()
        .iter()
        .map(Block::align)
        .collect();
    assert_eq!(
        aligns,
        vec![Alignment::Left, Alignment::Center, Alignment::Center]
    );
}

#[test]
fn undo_then_redo_restores_each_state() {
    let mut session = EditorSession::new();
    session.set_caret(Position::new(0, 0)).unwrap();
    type_text(&mut session, "Headline");
    let typed = session.document().clone();

    session
        .apply(Command::SetBlockType(BlockType::Heading(2)))
        .unwrap();
    let heading = session.document().clone();

    let update = session.apply(Command::Undo).unwrap();
    assert_eq!(session.document(), &typed);
    assert!(update.can_redo);
    assert_eq!(update.cause, UpdateCause::Command(CommandKind::Undo));

    session.apply(Command::Redo).unwrap();
    assert_eq!(session.document(), &heading);
    assert!(!session.can_redo());
}

#[test]
fn new_command_after_undo_discards_redo_branch() {
    let mut session = EditorSession::new();
    session.set_caret(Position::new(0, 0)).unwrap();
    type_text(&mut session, "a");
    type_text(&mut session, "b");

    session.apply(Command::Undo).unwrap();
    assert!(session.can_redo());

    type_text(&mut session, "c");
    assert!(!session.can_redo());
    assert_eq!(session.document().plain_text(), "ac");

    let err = session.apply(Command::Redo).unwrap_err();
    assert_eq!(err, CommandError::NoHistoryAvailable(HistoryDirection::Redo));
}

#[test]
fn undo_on_fresh_session_reports_no_history() {
    let mut session = EditorSession::new();
    let err = session.apply(Command::Undo).unwrap_err();
    assert_eq!(err, CommandError::NoHistoryAvailable(HistoryDirection::Undo));
    assert_eq!(err.code(), "no_history_available");
    assert_eq!(session.document(), &Document::new());
}

#[test]
fn history_capacity_bounds_undo_depth() {
    let mut session = EditorSession::with_capacity(3);
    session.set_caret(Position::new(0, 0)).unwrap();
    for letter in ["a", "b", "c", "d", "e"] {
        type_text(&mut session, letter);
    }

    session.apply(Command::Undo).unwrap();
    session.apply(Command::Undo).unwrap();
    assert_eq!(session.document().plain_text(), "abc");
    assert!(matches!(
        session.apply(Command::Undo),
        Err(CommandError::NoHistoryAvailable(HistoryDirection::Undo))
    ));
}

#[test]
fn oversized_history_capacity_opens_a_usable_session() {
    let mut session = EditorSession::with_capacity(usize::MAX);
    assert_eq!(session.history().capacity(), MAX_HISTORY_CAPACITY);

    session.set_caret(Position::new(0, 0)).unwrap();
    type_text(&mut session, "still editable");
    session.apply(Command::Undo).unwrap();
    assert_eq!(session.document(), &Document::new());
}

#[test]
fn listeners_fire_once_per_successful_command_and_can_unsubscribe() {
    let mut session = EditorSession::new();
    let seen: Arc<Mutex<Vec<EditorUpdate>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let id = session.subscribe(move |update| sink.lock().unwrap().push(*update));

    session.set_caret(Position::new(0, 0)).unwrap();
    type_text(&mut session, "x");
    let _ = session.apply(Command::Redo);

    {
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].cause, UpdateCause::SelectionChange);
        assert_eq!(
            seen[1].cause,
            UpdateCause::Command(CommandKind::InsertText)
        );
        assert!(seen[1].can_undo);
    }

    assert!(session.unsubscribe(id));
    assert!(!session.unsubscribe(id));
    type_text(&mut session, "y");
    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[test]
fn delete_backward_at_block_start_merges_blocks() {
    let mut session = EditorSession::new();
    session.set_caret(Position::new(0, 0)).unwrap();
    type_text(&mut session, "first");
    session.apply(Command::InsertParagraph).unwrap();
    type_text(&mut session, "second");
    assert_eq!(session.document().len(), 2);

    session.set_caret(Position::new(1, 0)).unwrap();
    session.apply(Command::DeleteBackward).unwrap();

    assert_eq!(session.document().len(), 1);
    assert_eq!(session.document().plain_text(), "firstsecond");
    assert_eq!(
        session.selection(),
        Some(Selection::caret(Position::new(0, 5)))
    );
}

#[test]
fn delete_backward_at_document_start_is_rejected() {
    let mut session = EditorSession::new();
    session.set_caret(Position::new(0, 0)).unwrap();
    let err = session.apply(Command::DeleteBackward).unwrap_err();
    assert_eq!(err, CommandError::NothingToDelete);
    assert_eq!(session.history().len(), 1);
}

#[test]
fn selection_outside_document_is_rejected() {
    let mut session = EditorSession::new();
    let err = session.set_caret(Position::new(0, 4)).unwrap_err();
    assert_eq!(err.code(), "invalid_selection");
    assert_eq!(session.selection(), None);
}

#[test]
fn snapshot_reloads_into_equal_document() {
    let mut session = session_with(hello_world_with_bold_hello());
    session.select_all();
    session
        .apply(Command::SetAlignment(Alignment::Justify))
        .unwrap();

    let snapshot: ExchangeForm = session.snapshot();
    let reopened = EditorSession::from_exchange(&snapshot, 10).unwrap();
    assert_eq!(reopened.document(), session.document());
    assert!(!reopened.can_undo());
}
