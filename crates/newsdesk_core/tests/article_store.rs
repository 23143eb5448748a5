use newsdesk_core::db::migrations::latest_version;
use newsdesk_core::exchange::{self, ExchangeForm};
use newsdesk_core::{
    ArticleRepository, ArticleService, ArticleServiceError, ArticleValidationError, BlockType,
    Command, ConnectionHandle, EditorSession, FormatFlag, NewArticle, Position, RepoError,
    Selection, SqliteArticleRepository,
};
use rusqlite::Connection;
use serde_json::json;
use std::thread;
use std::time::Duration;

fn body(text: &str) -> ExchangeForm {
    ExchangeForm::from_value(json!({
        "blocks": [{ "type": "paragraph", "runs": [{ "text": text }] }]
    }))
}

fn authored_snapshot() -> ExchangeForm {
    let mut session = EditorSession::new();
    session.set_caret(Position::new(0, 0)).unwrap();
    session
        .apply(Command::InsertText("Rocket launch\nThe rocket lifted off.".to_string()))
        .unwrap();
    session.set_caret(Position::new(0, 0)).unwrap();
    session
        .apply(Command::SetBlockType(BlockType::Heading(1)))
        .unwrap();
    session
        .set_selection(Selection::range(Position::new(1, 4), Position::new(1, 10)))
        .unwrap();
    session
        .apply(Command::ToggleFormat(FormatFlag::Bold))
        .unwrap();
    session.snapshot()
}

#[test]
fn publish_then_find_by_slug_returns_equal_document() {
    let handle = ConnectionHandle::in_memory();
    let service = ArticleService::new(SqliteArticleRepository::try_new(&handle).unwrap());
    let snapshot = authored_snapshot();

    let created = service.publish("Launch", "launch", &snapshot).unwrap();
    assert_eq!(created.title, "Launch");
    assert_eq!(created.slug, "launch");
    assert_eq!(
        created.preview_text.as_deref(),
        Some("Rocket launch The rocket lifted off.")
    );
    assert!(created.created_at > 0);

    let found = service.find_by_slug("launch").unwrap();
    assert_eq!(found.id, created.id);
    assert_eq!(found.content, snapshot);

    let document = service.open_document("launch").unwrap();
    assert_eq!(document, exchange::deserialize(&snapshot).unwrap());
}

#[test]
fn bold_hello_stored_under_launch_reads_back_equal() {
    let handle = ConnectionHandle::in_memory();
    let service = ArticleService::new(SqliteArticleRepository::try_new(&handle).unwrap());
    let input = ExchangeForm::from_json_str(
        r#"{"blocks":[{"type":"paragraph","runs":[{"text":"Hello","bold":true}]}]}"#,
    )
    .unwrap();

    service
        .create_article("Launch", "launch", Some(input.clone()))
        .unwrap();

    let found = service.find_by_slug("launch").unwrap();
    assert_eq!(found.content.as_value()["version"], json!(1));
    assert_eq!(
        exchange::deserialize(&found.content).unwrap(),
        exchange::deserialize(&input).unwrap()
    );
    assert_eq!(found.preview_text.as_deref(), Some("Hello"));
}

#[test]
fn unknown_slug_is_not_found() {
    let handle = ConnectionHandle::in_memory();
    let service = ArticleService::new(SqliteArticleRepository::try_new(&handle).unwrap());

    let err = service.find_by_slug("missing").unwrap_err();
    assert_eq!(err.code(), "not_found");
    assert!(matches!(err, ArticleServiceError::NotFound(ref slug) if slug == "missing"));
    assert!(matches!(
        service.render_article("missing"),
        Err(ArticleServiceError::NotFound(_))
    ));
}

#[test]
fn empty_title_is_validation_error_and_nothing_is_stored() {
    let handle = ConnectionHandle::in_memory();
    let service = ArticleService::new(SqliteArticleRepository::try_new(&handle).unwrap());

    let err = service
        .create_article("   ", "launch", Some(body("text")))
        .unwrap_err();
    assert!(matches!(
        err,
        ArticleServiceError::Validation(ArticleValidationError::EmptyTitle)
    ));
    assert_eq!(err.code(), "validation_error");

    let err = service
        .create_article("Title", "", Some(body("text")))
        .unwrap_err();
    assert!(matches!(
        err,
        ArticleServiceError::Validation(ArticleValidationError::EmptySlug)
    ));

    assert!(service.list_articles().unwrap().is_empty());
}

#[test]
fn repository_rejects_invalid_article_before_sql() {
    let handle = ConnectionHandle::in_memory();
    let repo = SqliteArticleRepository::try_new(&handle).unwrap();

    let article = NewArticle::new("Title", "slug", ExchangeForm::from_value(json!(null)));
    let err = repo.create_article(&article).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ArticleValidationError::EmptyContent)
    ));
}

#[test]
fn malformed_content_is_rejected_without_write() {
    let handle = ConnectionHandle::in_memory();
    let service = ArticleService::new(SqliteArticleRepository::try_new(&handle).unwrap());

    let content = ExchangeForm::from_value(json!({
        "blocks": [{ "type": "quote", "runs": [] }]
    }));
    let err = service
        .create_article("Title", "slug", Some(content))
        .unwrap_err();
    match err {
        ArticleServiceError::MalformedDocument(inner) => {
            assert_eq!(inner.path, "$.blocks[0].type");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(service.list_articles().unwrap().is_empty());
}

#[test]
fn duplicate_slug_resolves_to_newest_article() {
    let handle = ConnectionHandle::in_memory();
    let service = ArticleService::new(SqliteArticleRepository::try_new(&handle).unwrap());

    let first = service
        .create_article("First", "same", Some(body("one")))
        .unwrap();
    thread::sleep(Duration::from_millis(5));
    let second = service
        .create_article("Second", "same", Some(body("two")))
        .unwrap();
    assert_ne!(first.id, second.id);

    let found = service.find_by_slug("same").unwrap();
    assert_eq!(found.id, second.id);
    assert_eq!(found.title, "Second");

    let listed: Vec<String> = service
        .list_articles()
        .unwrap()
        .into_iter()
        .map(|article| article.title)
        .collect();
    assert_eq!(listed, vec!["Second".to_string(), "First".to_string()]);
}

#[test]
fn render_article_escapes_text_and_keeps_structure() {
    let handle = ConnectionHandle::in_memory();
    let service = ArticleService::new(SqliteArticleRepository::try_new(&handle).unwrap());
    service
        .create_article("Markup", "markup", Some(body("a < b & c")))
        .unwrap();

    let rendered = service.render_article("markup").unwrap();
    assert_eq!(rendered.title, "Markup");
    assert_eq!(rendered.html, "<p>a &lt; b &amp; c</p>");
}

#[test]
fn corrupted_row_surfaces_storage_failure() {
    let handle = ConnectionHandle::in_memory();
    let service = ArticleService::new(SqliteArticleRepository::try_new(&handle).unwrap());

    handle
        .with_connection(|conn| {
            conn.execute(
                "INSERT INTO articles (uuid, title, slug, content) VALUES ('not-a-uuid', 't', 'bad', '{}');",
                [],
            )
            .map_err(RepoError::from)
        })
        .unwrap();

    let err = service.find_by_slug("bad").unwrap_err();
    assert_eq!(err.code(), "storage_failure");
}

#[test]
fn try_new_rejects_database_without_articles_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("newsdesk.db");
    let handle = ConnectionHandle::file(&path);
    handle.with_connection(|_| Ok::<_, RepoError>(())).unwrap();
    handle
        .with_connection(|conn| {
            conn.execute_batch("DROP TABLE articles;")
                .map_err(RepoError::from)
        })
        .unwrap();

    let err = match SqliteArticleRepository::try_new(&handle) {
        Ok(_) => panic!("missing table must be rejected"),
        Err(err) => err,
    };
    assert!(matches!(err, RepoError::MissingRequiredTable("articles")));
}

#[test]
fn file_backed_store_survives_handle_release() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("newsdesk.db");
    let handle = ConnectionHandle::file(&path);

    {
        let service = ArticleService::new(SqliteArticleRepository::try_new(&handle).unwrap());
        service
            .create_article("Persisted", "persisted", Some(body("kept")))
            .unwrap();
    }
    assert!(handle.release().unwrap());
    assert!(!handle.is_open());

    let service = ArticleService::new(SqliteArticleRepository::try_new(&handle).unwrap());
    let found = service.find_by_slug("persisted").unwrap();
    assert_eq!(found.title, "Persisted");
    assert!(handle.is_open());

    let conn = Connection::open(&path).unwrap();
    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());
}
