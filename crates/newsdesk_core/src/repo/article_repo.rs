//! Article gateway contract and SQLite implementation.
//!
//! # Responsibility
//! - Store and retrieve articles by slug; document content stays opaque.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `NewArticle::validate()` before SQL mutations.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - Duplicate slugs are stored; `find_by_slug` returns the newest one.
//! - `list_articles` is ordered newest first.

use crate::db::{ConnectionHandle, DbError};
use crate::exchange::ExchangeForm;
use crate::model::article::{Article, ArticleValidationError, NewArticle};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const ARTICLE_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    slug,
    content,
    preview_text,
    created_at,
    updated_at
FROM articles";

const ARTICLE_COLUMNS: &[&str] = &[
    "uuid",
    "title",
    "slug",
    "content",
    "preview_text",
    "created_at",
    "updated_at",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for article persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ArticleValidationError),
    Db(DbError),
    InvalidData(String),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted article data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ArticleValidationError> for RepoError {
    fn from(value: ArticleValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence gateway for articles.
pub trait ArticleRepository {
    /// Inserts one article and returns the stored row.
    fn create_article(&self, article: &NewArticle) -> RepoResult<Article>;
    /// Returns the newest article stored under `slug`.
    fn find_by_slug(&self, slug: &str) -> RepoResult<Option<Article>>;
    /// Returns every article, newest first.
    fn list_articles(&self) -> RepoResult<Vec<Article>>;
}

/// SQLite-backed article repository over an injected connection handle.
pub struct SqliteArticleRepository<'h> {
    handle: &'h ConnectionHandle,
}

impl<'h> SqliteArticleRepository<'h> {
    /// Constructs a repository and verifies the schema it depends on.
    ///
    /// Opens the handle's connection if it is not open yet.
    pub fn try_new(handle: &'h ConnectionHandle) -> RepoResult<Self> {
        handle.with_connection(|conn| ensure_article_connection_ready(conn))?;
        Ok(Self { handle })
    }
}

impl ArticleRepository for SqliteArticleRepository<'_> {
    fn create_article(&self, article: &NewArticle) -> RepoResult<Article> {
        article.validate()?;

        self.handle.with_connection(|conn| {
            conn.execute(
                "INSERT INTO articles (
                    uuid,
                    title,
                    slug,
                    content,
                    preview_text
                ) VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    article.id.to_string(),
                    article.title.as_str(),
                    article.slug.as_str(),
                    article.content.to_json_string(),
                    article.preview_text.as_deref(),
                ],
            )?;

            let mut stmt = conn.prepare(&format!("{ARTICLE_SELECT_SQL} WHERE uuid = ?1;"))?;
            let mut rows = stmt.query([article.id.to_string()])?;
            let stored = match rows.next()? {
                Some(row) => parse_article_row(row)?,
                None => {
                    return Err(RepoError::InvalidData(format!(
                        "article {} missing after insert",
                        article.id
                    )));
                }
            };
            Ok(stored)
        })
    }

    fn find_by_slug(&self, slug: &str) -> RepoResult<Option<Article>> {
        self.handle.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{ARTICLE_SELECT_SQL}
                 WHERE slug = ?1
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT 1;"
            ))?;
            let row = stmt
                .query_row([slug], |row| Ok(parse_article_row(row)))
                .optional()?;
            row.transpose()
        })
    }

    fn list_articles(&self) -> RepoResult<Vec<Article>> {
        self.handle.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{ARTICLE_SELECT_SQL} ORDER BY created_at DESC, rowid DESC;"
            ))?;
            let mut rows = stmt.query([])?;
            let mut articles = Vec::new();
            while let Some(row) = rows.next()? {
                articles.push(parse_article_row(row)?);
            }
            Ok(articles)
        })
    }
}

fn parse_article_row(row: &Row<'_>) -> RepoResult<Article> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in articles.uuid"))
    })?;

    let content_text: String = row.get("content")?;
    let content = ExchangeForm::from_json_str(&content_text).map_err(|err| {
        RepoError::InvalidData(format!("invalid content for article {id}: {err}"))
    })?;

    Ok(Article {
        id,
        title: row.get("title")?,
        slug: row.get("slug")?,
        content,
        preview_text: row.get("preview_text")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn ensure_article_connection_ready(conn: &Connection) -> RepoResult<()> {
    if !table_exists(conn, "articles")? {
        return Err(RepoError::MissingRequiredTable("articles"));
    }
    for &column in ARTICLE_COLUMNS {
        if !table_has_column(conn, "articles", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "articles",
                column,
            });
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
