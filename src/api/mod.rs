//! HTTP API Handlers and Routes
//!
//! The REST layer, built on axum.
//!
//! # API Endpoints
//!
//! ## Subjects (`/api/subjects`, teacher)
//! - `POST /api/subjects` - Upload a document (multipart) and ingest it
//! - `GET /api/subjects` - List own subjects, newest first
//! - `GET /api/subjects/{subject_id}` - Own subject summary
//! - `PUT /api/subjects/{subject_id}` - Rename or reassign own subject
//! - `DELETE /api/subjects/{subject_id}` - Delete own subject
//!
//! ## Student (`/api/student`, student)
//! - `GET /api/student/subjects` - Subjects of the caller's class
//! - `POST /api/chat` - Ask a question about a class subject
//!
//! ## Health
//! - `GET /api/health` - Liveness check
//!
//! All endpoints except health require a bearer token:
//! ```text
//! Authorization: Bearer <token>
//! ```
//!
//! The OpenAPI document is served at `/api/openapi.json`.

/// Extractors with envelope-shaped rejections.
pub mod extract;
/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

use crate::types::{
    ChatRequest, ChatResponse, DeletedSubject, HealthResponse, SubjectSummary,
    UpdateSubjectRequest,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// OpenAPI description of the HTTP surface.
#[derive(OpenApi)]
#[openapi(
    info(title = "Syllabus API"),
    paths(
        handlers::health::health,
        handlers::subjects::create_subject,
        handlers::subjects::list_subjects,
        handlers::subjects::get_subject,
        handlers::subjects::update_subject,
        handlers::subjects::delete_subject,
        handlers::subjects::list_class_subjects,
        handlers::chat::chat,
    ),
    components(schemas(
        ChatRequest,
        ChatResponse,
        DeletedSubject,
        HealthResponse,
        SubjectSummary,
        UpdateSubjectRequest,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "subjects", description = "Teacher subject management"),
        (name = "student", description = "Student subject listing"),
        (name = "chat", description = "Questions over subject material"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
