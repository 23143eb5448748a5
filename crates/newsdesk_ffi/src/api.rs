//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose news article flows and editor sessions to Dart via FRB.
//! - Convert every core error into a response envelope with a stable code.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Editor sessions live in a process-wide registry keyed by session id;
//!   a failed command or save never mutates the session.
//! - The database handle is created from configuration on first use and
//!   opened lazily by the core.

use log::info;
use newsdesk_core::exchange::{self, ExchangeForm};
use newsdesk_core::{
    core_version as core_version_inner, init_logging as init_logging_inner,
    init_logging_with_config, ping as ping_inner, report_config_warnings, Alignment, Article, ArticleService, ArticleServiceError, BlockKind,
    BlockType, Command, CommandError, ConnectionHandle, CoreConfig, EditorSession, EditorUpdate,
    FormatFlag, Position, Selection, SqliteArticleRepository,
};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, OnceLock};
use uuid::Uuid;

const UNKNOWN_SESSION: &str = "unknown_session";
const INVALID_ARGUMENT: &str = "invalid_argument";
const INTERNAL_ERROR: &str = "internal_error";

static CONFIG: OnceLock<CoreConfig> = OnceLock::new();
static DB_HANDLE: OnceLock<ConnectionHandle> = OnceLock::new();
static SESSIONS: OnceLock<Mutex<HashMap<String, EditorSession>>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive);
///   blank uses `NEWSDESK_LOG_LEVEL` or the build default.
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    let started = if level.trim().is_empty() {
        init_logging_with_config(config(), &log_dir)
    } else {
        init_logging_inner(&level, &log_dir)
    };
    match started {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// List/detail projection of one stored article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsArticleItem {
    pub article_id: String,
    pub title: String,
    pub slug: String,
    pub preview_text: Option<String>,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
}

/// Response envelope for create/save flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsActionResponse {
    pub ok: bool,
    /// Stable error code (`validation_error|not_found|...`) on failure.
    pub error_code: Option<String>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
    pub article: Option<NewsArticleItem>,
}

impl NewsActionResponse {
    fn success(message: impl Into<String>, article: Article) -> Self {
        Self {
            ok: true,
            error_code: None,
            message: message.into(),
            article: Some(to_news_item(article)),
        }
    }

    fn failure(code: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error_code: Some(code.to_string()),
            message: message.into(),
            article: None,
        }
    }
}

/// Response envelope for the article detail view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsDetailResponse {
    pub ok: bool,
    pub error_code: Option<String>,
    pub message: String,
    pub article: Option<NewsArticleItem>,
    /// Canonical exchange form as JSON text.
    pub content_json: Option<String>,
    /// Escaped display markup.
    pub html: Option<String>,
}

/// Response envelope for the article list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsListResponse {
    pub ok: bool,
    pub error_code: Option<String>,
    pub message: String,
    /// Newest first.
    pub items: Vec<NewsArticleItem>,
}

/// Toolbar state after an editor call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorStateResponse {
    pub ok: bool,
    pub error_code: Option<String>,
    pub message: String,
    pub session_id: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub can_undo: bool,
    pub can_redo: bool,
    /// `paragraph` or `heading` for the block holding the focus.
    pub block_type: String,
    /// Heading level of the focused block.
    pub heading_level: Option<u32>,
    /// `left|center|right|justify` of the focused block.
    pub alignment: String,
}

impl EditorStateResponse {
    fn from_session(session_id: &str, session: &EditorSession, message: String) -> Self {
        let formats = session.formats();
        let focus_block = session
            .selection()
            .map_or(0, |selection| selection.focus.block);
        let block = session
            .document()
            .block(focus_block)
            .or_else(|| session.document().blocks().first());
        let (block_type, heading_level) = match block.map(|block| block.kind()) {
            Some(BlockKind::Heading(level)) => ("heading", Some(u32::from(level.get()))),
            _ => ("paragraph", None),
        };
        Self {
            ok: true,
            error_code: None,
            message,
            session_id: session_id.to_string(),
            bold: formats.bold,
            italic: formats.italic,
            underline: formats.underline,
            strikethrough: formats.strikethrough,
            can_undo: session.can_undo(),
            can_redo: session.can_redo(),
            block_type: block_type.to_string(),
            heading_level,
            alignment: block
                .map_or(Alignment::Left, |block| block.align())
                .as_str()
                .to_string(),
        }
    }

    fn rejected(mut self, code: &str, message: impl Into<String>) -> Self {
        self.ok = false;
        self.error_code = Some(code.to_string());
        self.message = message.into();
        self
    }

    fn failure(session_id: &str, code: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error_code: Some(code.to_string()),
            message: message.into(),
            session_id: session_id.to_string(),
            bold: false,
            italic: false,
            underline: false,
            strikethrough: false,
            can_undo: false,
            can_redo: false,
            block_type: "paragraph".to_string(),
            heading_level: None,
            alignment: Alignment::Left.as_str().to_string(),
        }
    }
}

/// Exchange form and markup of a live editor document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSnapshotResponse {
    pub ok: bool,
    pub error_code: Option<String>,
    pub message: String,
    pub content_json: String,
    pub html: String,
}

/// Stores one article from exchange JSON.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Blank `content_json` is a `validation_error`; unparsable or invalid
///   content is a `malformed_document`.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn news_create(title: String, slug: String, content_json: String) -> NewsActionResponse {
    let content = if content_json.trim().is_empty() {
        None
    } else {
        match ExchangeForm::from_json_str(&content_json) {
            Ok(form) => Some(form),
            Err(err) => return NewsActionResponse::failure("malformed_document", err.to_string()),
        }
    };

    match with_article_service(|service| service.create_article(&title, &slug, content)) {
        Ok(article) => NewsActionResponse::success("Article created.", article),
        Err(err) => NewsActionResponse::failure(err.code(), err.to_string()),
    }
}

/// Loads one article for the detail view.
#[flutter_rust_bridge::frb(sync)]
pub fn news_get(slug: String) -> NewsDetailResponse {
    let loaded = with_article_service(|service| {
        let article = service.find_by_slug(&slug)?;
        let document = exchange::deserialize(&article.content)?;
        Ok((article, exchange::render_html(&document)))
    });

    match loaded {
        Ok((article, html)) => NewsDetailResponse {
            ok: true,
            error_code: None,
            message: "Article loaded.".to_string(),
            content_json: Some(article.content.to_json_string()),
            html: Some(html),
            article: Some(to_news_item(article)),
        },
        Err(err) => NewsDetailResponse {
            ok: false,
            error_code: Some(err.code().to_string()),
            message: err.to_string(),
            article: None,
            content_json: None,
            html: None,
        },
    }
}

/// Lists stored articles, newest first.
#[flutter_rust_bridge::frb(sync)]
pub fn news_list() -> NewsListResponse {
    match with_article_service(|service| service.list_articles()) {
        Ok(articles) => {
            let items = articles.into_iter().map(to_news_item).collect::<Vec<_>>();
            let message = if items.is_empty() {
                "No articles.".to_string()
            } else {
                format!("Found {} article(s).", items.len())
            };
            NewsListResponse {
                ok: true,
                error_code: None,
                message,
                items,
            }
        }
        Err(err) => NewsListResponse {
            ok: false,
            error_code: Some(err.code().to_string()),
            message: err.to_string(),
            items: Vec::new(),
        },
    }
}

/// Starts an editor session, empty or on a stored article.
///
/// # FFI contract
/// - `slug = None` opens an empty document.
/// - Returns the new `session_id` on success.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_open(slug: Option<String>) -> EditorStateResponse {
    let capacity = config().history_capacity;
    let session = match slug.as_deref().map(str::trim).filter(|slug| !slug.is_empty()) {
        None => EditorSession::with_capacity(capacity),
        Some(slug) => {
            let opened = with_article_service(|service| {
                let article = service.find_by_slug(slug)?;
                Ok(EditorSession::from_exchange(&article.content, capacity)?)
            });
            match opened {
                Ok(session) => session,
                Err(err) => return EditorStateResponse::failure("", err.code(), err.to_string()),
            }
        }
    };

    let session_id = Uuid::new_v4().to_string();
    let response =
        EditorStateResponse::from_session(&session_id, &session, "Session opened.".to_string());
    match lock_sessions() {
        Ok(mut sessions) => {
            sessions.insert(session_id.clone(), session);
            info!(
                "event=editor_open module=ffi status=ok from_article={} open_sessions={}",
                slug.is_some(),
                sessions.len()
            );
            response
        }
        Err(message) => EditorStateResponse::failure(&session_id, INTERNAL_ERROR, message),
    }
}

/// Moves the selection; equal anchor and focus place a cursor.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_select(
    session_id: String,
    anchor_block: u32,
    anchor_offset: u32,
    focus_block: u32,
    focus_offset: u32,
) -> EditorStateResponse {
    let selection = Selection::range(
        Position::new(anchor_block as usize, anchor_offset as usize),
        Position::new(focus_block as usize, focus_offset as usize),
    );
    with_session(&session_id, |session| {
        session.set_selection(selection)?;
        Ok("Selection updated.".to_string())
    })
}

/// Toggles `bold|italic|underline|strikethrough` on the selection.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_toggle_format(session_id: String, flag: String) -> EditorStateResponse {
    with_session(&session_id, |session| {
        let flag = flag.parse::<FormatFlag>().map_err(Rejection::argument)?;
        Ok(describe_update(session.apply(Command::ToggleFormat(flag))?))
    })
}

/// Turns spanned blocks into headings; levels outside 1..=6 become 1.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_set_heading(session_id: String, level: i64) -> EditorStateResponse {
    apply_command(&session_id, Command::SetBlockType(BlockType::Heading(level)))
}

#[flutter_rust_bridge::frb(sync)]
pub fn editor_set_paragraph(session_id: String) -> EditorStateResponse {
    apply_command(&session_id, Command::SetBlockType(BlockType::Paragraph))
}

/// Aligns spanned blocks: `left|center|right|justify`.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_set_alignment(session_id: String, alignment: String) -> EditorStateResponse {
    with_session(&session_id, |session| {
        let align = alignment.parse::<Alignment>().map_err(Rejection::argument)?;
        Ok(describe_update(session.apply(Command::SetAlignment(align))?))
    })
}

/// Undo at the oldest entry returns `no_history_available` with state intact.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_undo(session_id: String) -> EditorStateResponse {
    apply_command(&session_id, Command::Undo)
}

#[flutter_rust_bridge::frb(sync)]
pub fn editor_redo(session_id: String) -> EditorStateResponse {
    apply_command(&session_id, Command::Redo)
}

#[flutter_rust_bridge::frb(sync)]
pub fn editor_insert_text(session_id: String, text: String) -> EditorStateResponse {
    apply_command(&session_id, Command::InsertText(text))
}

#[flutter_rust_bridge::frb(sync)]
pub fn editor_delete_backward(session_id: String) -> EditorStateResponse {
    apply_command(&session_id, Command::DeleteBackward)
}

#[flutter_rust_bridge::frb(sync)]
pub fn editor_insert_paragraph(session_id: String) -> EditorStateResponse {
    apply_command(&session_id, Command::InsertParagraph)
}

/// Returns the live document as exchange JSON plus preview markup.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_snapshot(session_id: String) -> EditorSnapshotResponse {
    let rendered = lock_sessions().and_then(|sessions| {
        sessions
            .get(&session_id)
            .map(|session| {
                (
                    session.snapshot().to_json_string(),
                    exchange::render_html(session.document()),
                )
            })
            .ok_or_else(|| unknown_session_message(&session_id))
    });
    match rendered {
        Ok((content_json, html)) => EditorSnapshotResponse {
            ok: true,
            error_code: None,
            message: "Snapshot taken.".to_string(),
            content_json,
            html,
        },
        Err(message) => EditorSnapshotResponse {
            ok: false,
            error_code: Some(UNKNOWN_SESSION.to_string()),
            message,
            content_json: String::new(),
            html: String::new(),
        },
    }
}

/// Publishes the live document as a new article.
///
/// # FFI contract
/// - The session stays open and unchanged whether or not the save succeeds.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_save(session_id: String, title: String, slug: String) -> NewsActionResponse {
    let snapshot = match lock_sessions().and_then(|sessions| {
        sessions
            .get(&session_id)
            .map(EditorSession::snapshot)
            .ok_or_else(|| unknown_session_message(&session_id))
    }) {
        Ok(snapshot) => snapshot,
        Err(message) => return NewsActionResponse::failure(UNKNOWN_SESSION, message),
    };

    match with_article_service(|service| service.publish(&title, &slug, &snapshot)) {
        Ok(article) => NewsActionResponse::success("Article published.", article),
        Err(err) => NewsActionResponse::failure(err.code(), err.to_string()),
    }
}

/// Ends a session; returns `false` for unknown ids.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_close(session_id: String) -> bool {
    match lock_sessions() {
        Ok(mut sessions) => {
            let closed = sessions.remove(&session_id).is_some();
            if closed {
                info!(
                    "event=editor_close module=ffi status=ok open_sessions={}",
                    sessions.len()
                );
            }
            closed
        }
        Err(_) => false,
    }
}

/// Why a call against a live session was refused.
struct Rejection {
    code: &'static str,
    message: String,
}

impl Rejection {
    fn argument(err: impl std::fmt::Display) -> Self {
        Self {
            code: INVALID_ARGUMENT,
            message: err.to_string(),
        }
    }
}

impl From<CommandError> for Rejection {
    fn from(err: CommandError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

fn apply_command(session_id: &str, command: Command) -> EditorStateResponse {
    with_session(session_id, |session| {
        Ok(describe_update(session.apply(command)?))
    })
}

/// Runs `f` against a live session; rejections keep the session's state
/// in the response.
fn with_session(
    session_id: &str,
    f: impl FnOnce(&mut EditorSession) -> Result<String, Rejection>,
) -> EditorStateResponse {
    let mut sessions = match lock_sessions() {
        Ok(sessions) => sessions,
        Err(message) => return EditorStateResponse::failure(session_id, INTERNAL_ERROR, message),
    };
    let Some(session) = sessions.get_mut(session_id) else {
        return EditorStateResponse::failure(
            session_id,
            UNKNOWN_SESSION,
            unknown_session_message(session_id),
        );
    };

    match f(session) {
        Ok(message) => EditorStateResponse::from_session(session_id, session, message),
        Err(rejection) => EditorStateResponse::from_session(session_id, session, String::new())
            .rejected(rejection.code, rejection.message),
    }
}

fn describe_update(update: EditorUpdate) -> String {
    format!("Applied (history seq {}).", update.seq)
}

fn lock_sessions() -> Result<MutexGuard<'static, HashMap<String, EditorSession>>, String> {
    SESSIONS
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .map_err(|_| "editor session registry poisoned".to_string())
}

fn unknown_session_message(session_id: &str) -> String {
    format!("unknown editor session `{session_id}`")
}

fn config() -> &'static CoreConfig {
    CONFIG.get_or_init(|| {
        let loaded = CoreConfig::from_env();
        report_config_warnings(&loaded.warnings);
        loaded.config
    })
}

fn db_handle() -> &'static ConnectionHandle {
    DB_HANDLE.get_or_init(|| ConnectionHandle::file(config().db_path.clone()))
}

fn with_article_service<T>(
    f: impl FnOnce(&ArticleService<SqliteArticleRepository<'static>>) -> Result<T, ArticleServiceError>,
) -> Result<T, ArticleServiceError> {
    let repo = SqliteArticleRepository::try_new(db_handle())?;
    let service = ArticleService::new(repo);
    f(&service)
}

fn to_news_item(article: Article) -> NewsArticleItem {
    NewsArticleItem {
        article_id: article.id.to_string(),
        title: article.title,
        slug: article.slug,
        preview_text: article.preview_text,
        created_at: article.created_at,
        updated_at: article.updated_at,
    }
}
