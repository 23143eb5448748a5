//! Article use-case service.
//!
//! # Responsibility
//! - Validate and publish editor snapshots as stored articles.
//! - Resolve slugs into articles, editable documents or display markup.
//! - Map gateway failures onto the user-visible error taxonomy.
//!
//! # Invariants
//! - Title and slug are trimmed before validation and storage.
//! - Stored content is always the canonical re-serialization of a
//!   successfully deserialized document.
//! - A failed save never touches the caller's in-memory document.

use crate::exchange::{self, ExchangeForm, MalformedDocument};
use crate::model::article::{Article, ArticleValidationError, NewArticle};
use crate::model::document::Document;
use crate::repo::article_repo::{ArticleRepository, RepoError};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for article use-cases.
#[derive(Debug)]
pub enum ArticleServiceError {
    /// Missing or empty title, slug or content.
    Validation(ArticleValidationError),
    /// No article stored under the slug.
    NotFound(String),
    /// Content failed exchange-form validation.
    MalformedDocument(MalformedDocument),
    /// Gateway I/O or persisted-data failure.
    StorageFailure(RepoError),
}

impl ArticleServiceError {
    /// Stable machine-readable code used in logs and FFI envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::MalformedDocument(_) => "malformed_document",
            Self::StorageFailure(_) => "storage_failure",
        }
    }
}

impl Display for ArticleServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(slug) => write!(f, "article not found: `{slug}`"),
            Self::MalformedDocument(err) => write!(f, "{err}"),
            Self::StorageFailure(err) => write!(f, "storage failure: {err}"),
        }
    }
}

impl Error for ArticleServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::MalformedDocument(err) => Some(err),
            Self::StorageFailure(err) => Some(err),
        }
    }
}

impl From<RepoError> for ArticleServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::StorageFailure(other),
        }
    }
}

impl From<ArticleValidationError> for ArticleServiceError {
    fn from(value: ArticleValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<MalformedDocument> for ArticleServiceError {
    fn from(value: MalformedDocument) -> Self {
        Self::MalformedDocument(value)
    }
}

/// Display projection of one article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArticle {
    pub title: String,
    pub slug: String,
    pub html: String,
}

/// Article service facade over a gateway implementation.
pub struct ArticleService<R: ArticleRepository> {
    repo: R,
}

impl<R: ArticleRepository> ArticleService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates and stores one article.
    ///
    /// # Errors
    /// - `Validation` when title, slug or content is absent or empty,
    ///   including a document with no text at all.
    /// - `MalformedDocument` when content does not deserialize.
    /// - `StorageFailure` when the gateway fails.
    pub fn create_article(
        &self,
        title: &str,
        slug: &str,
        content: Option<ExchangeForm>,
    ) -> Result<Article, ArticleServiceError> {
        let result = self.create_article_inner(title.trim(), slug.trim(), content);
        match &result {
            Ok(article) => info!(
                "event=article_create module=service status=ok article_id={} blocks={}",
                article.id,
                block_count(&article.content)
            ),
            Err(err @ ArticleServiceError::StorageFailure(_)) => error!(
                "event=article_create module=service status=error error_code={} error={}",
                err.code(),
                err
            ),
            Err(err) => warn!(
                "event=article_create module=service status=rejected error_code={}",
                err.code()
            ),
        }
        result
    }

    /// Publishes an editor snapshot.
    pub fn publish(
        &self,
        title: &str,
        slug: &str,
        snapshot: &ExchangeForm,
    ) -> Result<Article, ArticleServiceError> {
        self.create_article(title, slug, Some(snapshot.clone()))
    }

    /// Returns the newest article stored under `slug`.
    pub fn find_by_slug(&self, slug: &str) -> Result<Article, ArticleServiceError> {
        let slug = slug.trim();
        self.repo
            .find_by_slug(slug)?
            .ok_or_else(|| ArticleServiceError::NotFound(slug.to_string()))
    }

    /// Lists every stored article, newest first.
    pub fn list_articles(&self) -> Result<Vec<Article>, ArticleServiceError> {
        Ok(self.repo.list_articles()?)
    }

    /// Loads an article body as an editable document.
    pub fn open_document(&self, slug: &str) -> Result<Document, ArticleServiceError> {
        let article = self.find_by_slug(slug)?;
        Ok(exchange::deserialize(&article.content)?)
    }

    /// Renders an article for read-only display.
    pub fn render_article(&self, slug: &str) -> Result<RenderedArticle, ArticleServiceError> {
        let article = self.find_by_slug(slug)?;
        let document = exchange::deserialize(&article.content)?;
        Ok(RenderedArticle {
            title: article.title,
            slug: article.slug,
            html: exchange::render_html(&document),
        })
    }

    fn create_article_inner(
        &self,
        title: &str,
        slug: &str,
        content: Option<ExchangeForm>,
    ) -> Result<Article, ArticleServiceError> {
        let content = content.ok_or(ArticleValidationError::EmptyContent)?;
        let mut article = NewArticle::new(title, slug, content);
        article.validate()?;

        let document = exchange::deserialize(&article.content)?;
        if document.plain_text().trim().is_empty() {
            return Err(ArticleValidationError::EmptyContent.into());
        }
        article.content = exchange::serialize(&document);
        article.preview_text = exchange::derive_preview_text(&document);

        Ok(self.repo.create_article(&article)?)
    }
}

fn block_count(content: &ExchangeForm) -> usize {
    content
        .as_value()
        .get("blocks")
        .and_then(|blocks| blocks.as_array())
        .map_or(0, Vec::len)
}
