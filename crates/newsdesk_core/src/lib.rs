//! Core editing engine and article store for Newsdesk.
//! This crate is the single source of truth for document invariants.

pub mod config;
pub mod db;
pub mod editor;
pub mod exchange;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{CoreConfig, LoadedConfig};
pub use db::{ConnectionHandle, DbError, DbTarget};
pub use editor::command::{
    BlockType, Command, CommandError, CommandKind, EditorUpdate, UpdateCause,
};
pub use editor::history::{HistoryDirection, HistoryStack, NoHistoryAvailable};
pub use editor::session::{EditorSession, SubscriptionId};
pub use editor::tracker::{FormatSnapshot, SelectionTracker};
pub use exchange::{ExchangeForm, MalformedDocument};
pub use logging::{
    default_log_level, init_logging, init_logging_with_config, logging_status,
    report_config_warnings, LogTarget,
};
pub use model::article::{Article, ArticleId, ArticleValidationError, NewArticle};
pub use model::document::{
    Alignment, Block, BlockKind, Document, FormatFlag, FormatSet, HeadingLevel, TextRun,
};
pub use model::selection::{Position, Selection};
pub use repo::article_repo::{ArticleRepository, RepoError, RepoResult, SqliteArticleRepository};
pub use service::article_service::{ArticleService, ArticleServiceError, RenderedArticle};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
