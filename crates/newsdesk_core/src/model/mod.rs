//! Domain model for editable documents and stored articles.
//!
//! # Responsibility
//! - Define the in-memory rich-text tree edited by the command engine.
//! - Define the persisted article shape owned by the gateway.
//!
//! # Invariants
//! - One `Document` owns its node tree; nodes are never shared.
//! - Articles reference document content only through the exchange form.

pub mod article;
pub mod document;
pub mod selection;
