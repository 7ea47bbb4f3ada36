//! Request extractors that reject with the API's JSON error envelope.

use crate::types::AppError;
use axum::extract::FromRequest;

/// `axum::Json` whose rejection is an [`AppError::InvalidInput`], so a
/// malformed body gets `{"success": false, "message": ...}` like every other
/// failure.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
