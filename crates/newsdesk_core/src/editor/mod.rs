//! Document editing engine.
//!
//! # Responsibility
//! - Apply the closed command set to the live document.
//! - Track undo/redo history and toolbar format state.
//! - Notify subscribers synchronously after every successful update.
//!
//! # Invariants
//! - One session owns exactly one live document.
//! - Commands run to completion; there is no overlapping mutation.

pub mod command;
pub mod history;
pub mod session;
pub mod tracker;
