//! Flutter-facing bindings for the Newsdesk core.

pub mod api;
