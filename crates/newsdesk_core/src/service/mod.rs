//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate gateway calls into use-case level APIs.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod article_service;
