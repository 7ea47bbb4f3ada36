use crate::auth::jwt::AuthService;
use crate::types::{AppError, Claims, ClassScope, Role};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Verifies the bearer token and stores its [`Claims`] in the request
/// extensions for the extractors below.
pub async fn auth_middleware(
    State(auth_service): State<Arc<AuthService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Auth("Expected a bearer token".to_string()))?;

    let claims = auth_service.verify_token(token).inspect_err(|e| {
        tracing::debug!(error = %e, "Rejected token");
    })?;
    tracing::debug!(sub = %claims.sub, role = %claims.role, "Authenticated request");

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

fn claims_from(parts: &Parts) -> Result<Claims, AppError> {
    parts
        .extensions
        .get::<Claims>()
        .cloned()
        .ok_or_else(|| AppError::Auth("Not authenticated".to_string()))
}

/// An authenticated teacher.
pub struct TeacherUser(pub Claims);

impl TeacherUser {
    pub fn teacher_id(&self) -> &str {
        &self.0.sub
    }
}

impl<S> FromRequestParts<S> for TeacherUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = claims_from(parts)?;
        match claims.role {
            Role::Teacher => Ok(TeacherUser(claims)),
            Role::Student => Err(AppError::Forbidden("Teacher access required".to_string())),
        }
    }
}

/// An authenticated student together with the class they belong to.
pub struct StudentUser {
    pub claims: Claims,
    pub class: ClassScope,
}

impl<S> FromRequestParts<S> for StudentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = claims_from(parts)?;
        if claims.role != Role::Student {
            return Err(AppError::Forbidden("Student access required".to_string()));
        }

        let class = claims
            .class_scope()
            .ok_or_else(|| AppError::Auth("Student token is missing its class".to_string()))?;
        Ok(StudentUser { claims, class })
    }
}
