//! JWT Authentication and Middleware
//!
//! # Module Structure
//!
//! - [`auth::jwt`](crate::auth::jwt) - JWT token encoding and verification
//! - [`auth::middleware`](crate::auth::middleware) - Axum middleware and role extractors
//!
//! Tokens are HS256-signed and carry a `role` claim (`teacher` or `student`).
//! Student tokens also carry `standard` and `division`, which scope what the
//! student can list and chat with.
//!
//! # Extracting Claims in Handlers
//!
//! ```ignore
//! async fn handler(TeacherUser(claims): TeacherUser) -> impl IntoResponse {
//!     format!("Hello, {}!", claims.sub)
//! }
//! ```
//!
//! # Configuration
//!
//! Configure via `syllabus.toml`:
//! ```toml
//! [auth]
//! jwt_secret_env = "JWT_SECRET"  # env var holding the signing secret
//! token_expiry = 86400           # seconds
//! ```

/// JWT token generation and validation.
pub mod jwt;
/// Authentication middleware and extractors for protected routes.
pub mod middleware;
