use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============= API Request/Response Types =============

/// Standard response envelope used by every JSON endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub subject_id: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub subject_id: String,
    pub subject_name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Metadata changes for an existing subject. Omitted or blank fields keep
/// their current value; the stored chunks and vectors are never touched.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubjectRequest {
    #[serde(default)]
    pub subject_name: Option<String>,
    #[serde(default)]
    pub standard: Option<String>,
    #[serde(default)]
    pub division: Option<String>,
}

/// Identifies a subject removed by a teacher.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletedSubject {
    pub subject_id: String,
}

// ============= Subject Types =============

/// Classification a subject is published to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ClassScope {
    pub standard: String,
    pub division: String,
}

impl ClassScope {
    pub fn new(standard: impl Into<String>, division: impl Into<String>) -> Self {
        Self {
            standard: standard.into(),
            division: division.into(),
        }
    }
}

/// Metadata supplied by the teacher when ingesting a document.
#[derive(Debug, Clone)]
pub struct SubjectMeta {
    pub name: String,
    pub standard: String,
    pub division: String,
    pub teacher_id: String,
}

/// A row ready to be written by a [`SubjectStore`](crate::db::SubjectStore).
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubject {
    pub subject_id: String,
    pub name: String,
    pub standard: String,
    pub division: String,
    pub teacher_id: String,
    pub content: String,
    /// Serialized, index-ordered `[{text, embedding}]` list.
    pub vectors: String,
}

/// A persisted subject, including raw text and the vector blob.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectRecord {
    pub id: i64,
    pub subject_id: String,
    pub name: String,
    pub standard: String,
    pub division: String,
    pub teacher_id: String,
    pub content: String,
    pub vectors: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubjectRecord {
    pub fn scope(&self) -> ClassScope {
        ClassScope::new(self.standard.clone(), self.division.clone())
    }

    pub fn summary(&self) -> SubjectSummary {
        SubjectSummary {
            id: self.id,
            subject_id: self.subject_id.clone(),
            subject_name: self.name.clone(),
            standard: self.standard.clone(),
            division: self.division.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Public view of a subject. Never carries raw text or vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubjectSummary {
    pub id: i64,
    pub subject_id: String,
    pub subject_name: String,
    pub standard: String,
    pub division: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============= Generation Types =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

// ============= Authentication Types =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Student,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Teacher => write!(f, "teacher"),
            Role::Student => write!(f, "student"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division: Option<String>,
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    /// The class a student token is bound to, if both fields are present.
    pub fn class_scope(&self) -> Option<ClassScope> {
        match (&self.standard, &self.division) {
            (Some(standard), Some(division)) => {
                Some(ClassScope::new(standard.clone(), division.clone()))
            }
            _ => None,
        }
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Document appears to be empty or corrupted")]
    EmptyDocument,

    #[error("Subject not found: {0}")]
    SubjectNotFound(String),

    #[error("Corrupt vector data: {0}")]
    CorruptVectorData(String),

    #[error("Embedding provider error: {0}")]
    UpstreamEmbedding(String),

    #[error("Generation provider error: {0}")]
    UpstreamGeneration(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// A class already has a subject with this name.
    pub fn duplicate_subject() -> Self {
        AppError::InvalidInput("Subject already exists for this standard and division".to_string())
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;

        match self {
            AppError::InvalidInput(_) | AppError::EmptyDocument => StatusCode::BAD_REQUEST,
            AppError::SubjectNotFound(_) => StatusCode::NOT_FOUND,
            AppError::UpstreamEmbedding(_) | AppError::UpstreamGeneration(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::CorruptVectorData(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether the detail of this error may be shown to the caller.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AppError::CorruptVectorData(_) | AppError::Database(_) | AppError::Internal(_)
        )
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        let message = if self.is_internal() {
            tracing::error!(error = %self, "Request failed with internal error");
            "Internal server error".to_string()
        } else {
            match &self {
                AppError::InvalidInput(msg)
                | AppError::SubjectNotFound(msg)
                | AppError::UpstreamEmbedding(msg)
                | AppError::UpstreamGeneration(msg)
                | AppError::Auth(msg)
                | AppError::Forbidden(msg) => msg.clone(),
                other => other.to_string(),
            }
        };

        let body = serde_json::json!({
            "success": false,
            "message": message
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
