//! Repository layer: persistence gateway contracts and implementations.
//!
//! # Responsibility
//! - Define the article gateway consumed by the service layer.
//! - Isolate SQLite query details from use-case orchestration.
//!
//! # Invariants
//! - Repository writes enforce `NewArticle::validate()` before persistence.
//! - Document content is stored and returned as an opaque exchange form.

pub mod article_repo;
