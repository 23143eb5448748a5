//! Stored news article record.
//!
//! # Responsibility
//! - Define the persisted article shape exchanged with the gateway.
//! - Validate required fields before any storage write.
//!
//! # Invariants
//! - `title` and `slug` are non-empty after trimming.
//! - `content` is a non-empty exchange form.
//! - `slug` is the external lookup key; uniqueness is not enforced.

use crate::exchange::ExchangeForm;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable article identifier.
pub type ArticleId = Uuid;

/// Persisted article as returned by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub slug: String,
    /// Canonical exchange form of the article body.
    pub content: ExchangeForm,
    /// Plain-text summary for list views (nullable).
    pub preview_text: Option<String>,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
}

/// Write model for article creation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewArticle {
    pub id: ArticleId,
    pub title: String,
    pub slug: String,
    pub content: ExchangeForm,
    pub preview_text: Option<String>,
}

impl NewArticle {
    /// Creates a write model with a generated id and no preview.
    pub fn new(title: impl Into<String>, slug: impl Into<String>, content: ExchangeForm) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            slug: slug.into(),
            content,
            preview_text: None,
        }
    }

    /// Checks required fields.
    ///
    /// # Errors
    /// - `EmptyTitle` / `EmptySlug` for blank strings.
    /// - `EmptyContent` when the exchange form carries no value.
    pub fn validate(&self) -> Result<(), ArticleValidationError> {
        if self.title.trim().is_empty() {
            return Err(ArticleValidationError::EmptyTitle);
        }
        if self.slug.trim().is_empty() {
            return Err(ArticleValidationError::EmptySlug);
        }
        if self.content.is_empty() {
            return Err(ArticleValidationError::EmptyContent);
        }
        Ok(())
    }
}

/// Missing or empty required article field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleValidationError {
    EmptyTitle,
    EmptySlug,
    EmptyContent,
}

impl Display for ArticleValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title is required"),
            Self::EmptySlug => write!(f, "slug is required"),
            Self::EmptyContent => write!(f, "content is required"),
        }
    }
}

impl Error for ArticleValidationError {}
