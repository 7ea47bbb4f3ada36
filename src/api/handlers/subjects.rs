//! Subject upload, listing, update and removal.
//!
//! Teachers manage the subjects they uploaded; students list the subjects
//! published to their own class.

use crate::{
    api::extract::ApiJson,
    auth::middleware::{StudentUser, TeacherUser},
    rag::{DocumentKind, UploadedDocument},
    types::{
        ApiResponse, AppError, ClassScope, DeletedSubject, Result, SubjectMeta, SubjectSummary,
        UpdateSubjectRequest,
    },
    AppState,
};
use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    http::StatusCode,
    Json,
};

/// Multipart field names accepted for the document itself.
const DOCUMENT_FIELDS: [&str; 2] = ["pdf", "document"];

#[derive(Default)]
struct SubjectForm {
    name: Option<String>,
    standard: Option<String>,
    division: Option<String>,
    document: Option<UploadedDocument>,
}

/// A trimmed, non-blank value, if one was sent.
fn provided(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    provided(value).ok_or_else(|| AppError::InvalidInput(format!("{} is required", field)))
}

fn not_found() -> AppError {
    AppError::SubjectNotFound("Subject not found".to_string())
}

async fn read_text(field: Field<'_>, name: &str) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid {} field: {}", name, e)))
}

async fn read_document(field: Field<'_>, max_bytes: usize) -> Result<UploadedDocument> {
    let kind = DocumentKind::detect(field.content_type(), field.file_name())?;
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read upload: {}", e)))?;

    if bytes.len() > max_bytes {
        return Err(AppError::InvalidInput(format!(
            "Document exceeds the {} byte upload limit",
            max_bytes
        )));
    }

    UploadedDocument::from_bytes(&bytes, kind)
}

/// Upload a document and ingest it as a new subject.
///
/// Multipart fields: `pdf` (or `document`), `subjectName`, `standard`,
/// `division`.
#[utoipa::path(
    post,
    path = "/api/subjects",
    request_body(content_type = "multipart/form-data", description = "Fields: pdf, subjectName, standard, division"),
    responses(
        (status = 201, description = "Subject created", body = ApiResponse<SubjectSummary>),
        (status = 400, description = "Missing field, unsupported or empty document"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Teacher access required"),
        (status = 502, description = "Embedding provider failed")
    ),
    tag = "subjects",
    security(("bearer" = []))
)]
pub async fn create_subject(
    State(state): State<AppState>,
    teacher: TeacherUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<SubjectSummary>>)> {
    let max_bytes = state.config.server.max_upload_bytes;
    let mut form = SubjectForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "subjectName" => form.name = Some(read_text(field, &name).await?),
            "standard" => form.standard = Some(read_text(field, &name).await?),
            "division" => form.division = Some(read_text(field, &name).await?),
            n if DOCUMENT_FIELDS.contains(&n) => {
                form.document = Some(read_document(field, max_bytes).await?)
            }
            other => tracing::debug!(field = %other, "Ignoring unknown multipart field"),
        }
    }

    let meta = SubjectMeta {
        name: required(form.name, "subjectName")?,
        standard: required(form.standard, "standard")?,
        division: required(form.division, "division")?,
        teacher_id: teacher.teacher_id().to_string(),
    };
    let document = form
        .document
        .ok_or_else(|| AppError::InvalidInput("A PDF document is required".to_string()))?;

    tracing::info!(
        teacher_id = %meta.teacher_id,
        subject = %meta.name,
        bytes = document.size(),
        kind = ?document.kind(),
        "Subject upload received"
    );

    let summary = state.ingestion.ingest_document(meta, document).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Subject created successfully",
            summary,
        )),
    ))
}

/// List the calling teacher's subjects, newest first.
#[utoipa::path(
    get,
    path = "/api/subjects",
    responses(
        (status = 200, description = "Subjects uploaded by the caller", body = ApiResponse<Vec<SubjectSummary>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Teacher access required")
    ),
    tag = "subjects",
    security(("bearer" = []))
)]
pub async fn list_subjects(
    State(state): State<AppState>,
    teacher: TeacherUser,
) -> Result<Json<ApiResponse<Vec<SubjectSummary>>>> {
    let subjects = state
        .store
        .list_teacher_subjects(teacher.teacher_id())
        .await?;
    Ok(Json(ApiResponse::ok(subjects)))
}

/// Fetch one of the calling teacher's subjects.
#[utoipa::path(
    get,
    path = "/api/subjects/{subject_id}",
    params(("subject_id" = String, Path, description = "Public subject id")),
    responses(
        (status = 200, description = "Subject summary", body = ApiResponse<SubjectSummary>),
        (status = 404, description = "No such subject for this teacher")
    ),
    tag = "subjects",
    security(("bearer" = []))
)]
pub async fn get_subject(
    State(state): State<AppState>,
    teacher: TeacherUser,
    Path(subject_id): Path<String>,
) -> Result<Json<ApiResponse<SubjectSummary>>> {
    let subject = state
        .store
        .get_teacher_subject(teacher.teacher_id(), &subject_id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(ApiResponse::ok(subject)))
}

/// Rename one of the calling teacher's subjects or move it to another class.
///
/// Only metadata changes; the stored text, chunks and vectors stay as they
/// were ingested.
#[utoipa::path(
    put,
    path = "/api/subjects/{subject_id}",
    params(("subject_id" = String, Path, description = "Public subject id")),
    request_body = UpdateSubjectRequest,
    responses(
        (status = 200, description = "Subject updated", body = ApiResponse<SubjectSummary>),
        (status = 400, description = "Malformed body or the class already has a subject with this name"),
        (status = 404, description = "No such subject for this teacher")
    ),
    tag = "subjects",
    security(("bearer" = []))
)]
pub async fn update_subject(
    State(state): State<AppState>,
    teacher: TeacherUser,
    Path(subject_id): Path<String>,
    ApiJson(payload): ApiJson<UpdateSubjectRequest>,
) -> Result<Json<ApiResponse<SubjectSummary>>> {
    let current = state
        .store
        .get_teacher_subject(teacher.teacher_id(), &subject_id)
        .await?
        .ok_or_else(not_found)?;

    let name = provided(payload.subject_name).unwrap_or(current.subject_name);
    let scope = ClassScope::new(
        provided(payload.standard).unwrap_or(current.standard),
        provided(payload.division).unwrap_or(current.division),
    );

    if let Some(existing) = state.store.find_class_subject(&name, &scope).await? {
        if existing.subject_id != subject_id {
            return Err(AppError::duplicate_subject());
        }
    }

    let updated = state
        .store
        .update_subject(teacher.teacher_id(), &subject_id, &name, &scope)
        .await?
        .ok_or_else(not_found)?;

    tracing::info!(
        teacher_id = %teacher.teacher_id(),
        subject_id = %subject_id,
        subject = %updated.subject_name,
        standard = %updated.standard,
        division = %updated.division,
        "Subject updated"
    );

    Ok(Json(ApiResponse::with_message(
        "Subject updated successfully",
        updated,
    )))
}

/// Delete one of the calling teacher's subjects with all of its chunks.
#[utoipa::path(
    delete,
    path = "/api/subjects/{subject_id}",
    params(("subject_id" = String, Path, description = "Public subject id")),
    responses(
        (status = 200, description = "Subject deleted", body = ApiResponse<DeletedSubject>),
        (status = 404, description = "No such subject for this teacher")
    ),
    tag = "subjects",
    security(("bearer" = []))
)]
pub async fn delete_subject(
    State(state): State<AppState>,
    teacher: TeacherUser,
    Path(subject_id): Path<String>,
) -> Result<Json<ApiResponse<DeletedSubject>>> {
    let deleted = state
        .store
        .delete_subject(teacher.teacher_id(), &subject_id)
        .await?;
    if !deleted {
        return Err(not_found());
    }

    tracing::info!(teacher_id = %teacher.teacher_id(), subject_id = %subject_id, "Subject deleted");

    Ok(Json(ApiResponse::with_message(
        "Subject deleted successfully",
        DeletedSubject { subject_id },
    )))
}

/// List the subjects published to the calling student's class.
#[utoipa::path(
    get,
    path = "/api/student/subjects",
    responses(
        (status = 200, description = "Subjects of the caller's class", body = ApiResponse<Vec<SubjectSummary>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Student access required")
    ),
    tag = "student",
    security(("bearer" = []))
)]
pub async fn list_class_subjects(
    State(state): State<AppState>,
    student: StudentUser,
) -> Result<Json<ApiResponse<Vec<SubjectSummary>>>> {
    let subjects = state.store.list_class_subjects(&student.class).await?;
    Ok(Json(ApiResponse::ok(subjects)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_trims_and_rejects_blank() {
        assert_eq!(required(Some("  Physics ".into()), "subjectName").unwrap(), "Physics");
        assert!(matches!(
            required(Some("   ".into()), "standard"),
            Err(AppError::InvalidInput(m)) if m == "standard is required"
        ));
        assert!(required(None, "division").is_err());
    }

    #[test]
    fn test_provided_treats_blank_as_absent() {
        assert_eq!(provided(Some(" 9 ".into())), Some("9".to_string()));
        assert_eq!(provided(Some("  ".into())), None);
        assert_eq!(provided(None), None);
    }
}
