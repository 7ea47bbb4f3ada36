use crate::{
    api::extract::ApiJson,
    auth::middleware::StudentUser,
    types::{ApiResponse, ChatRequest, ChatResponse, Result},
    AppState,
};
use axum::{extract::State, Json};

/// Ask a question about one of the student's class subjects
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Answer grounded in the subject material", body = ApiResponse<ChatResponse>),
        (status = 400, description = "Malformed body, invalid subject id or prompt"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Student access required"),
        (status = 404, description = "Subject not found in the student's class"),
        (status = 502, description = "Embedding or generation provider failed")
    ),
    tag = "chat",
    security(("bearer" = []))
)]
pub async fn chat(
    State(state): State<AppState>,
    student: StudentUser,
    ApiJson(payload): ApiJson<ChatRequest>,
) -> Result<Json<ApiResponse<ChatResponse>>> {
    tracing::debug!(
        student = %student.claims.sub,
        subject_id = %payload.subject_id,
        prompt_chars = payload.prompt.chars().count(),
        "Chat request"
    );

    let response = state
        .query
        .query(&payload.subject_id, &payload.prompt, Some(&student.class))
        .await?;

    Ok(Json(ApiResponse::ok(response)))
}
