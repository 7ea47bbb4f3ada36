//! API request handlers.

/// Student chat handler.
pub mod chat;
/// Liveness handler.
pub mod health;
/// Subject upload, listing and removal handlers.
pub mod subjects;
