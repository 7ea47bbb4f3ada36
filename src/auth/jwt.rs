use crate::types::{AppError, Claims, ClassScope, Result, Role};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

/// Authentication service for JWT token management.
///
/// Tokens are HS256-signed and carry the caller's role. Student tokens also
/// carry the class (standard and division) the student belongs to.
pub struct AuthService {
    jwt_secret: String,
    token_expiry: i64,
}

impl AuthService {
    /// Creates a new AuthService.
    ///
    /// # Arguments
    /// * `jwt_secret` - Secret key for signing JWTs (should be at least 32 chars)
    /// * `token_expiry` - Token validity in seconds
    pub fn new(jwt_secret: String, token_expiry: i64) -> Self {
        Self {
            jwt_secret,
            token_expiry,
        }
    }

    pub fn token_expiry(&self) -> i64 {
        self.token_expiry
    }

    /// Mints a token for `subject`.
    ///
    /// Students must be given a class; teachers must not.
    pub fn generate_token(
        &self,
        subject: &str,
        role: Role,
        class: Option<&ClassScope>,
    ) -> Result<String> {
        if subject.trim().is_empty() {
            return Err(AppError::InvalidInput("Token subject is required".into()));
        }
        match (role, class) {
            (Role::Student, None) => {
                return Err(AppError::InvalidInput(
                    "Student tokens need a standard and division".into(),
                ));
            }
            (Role::Teacher, Some(_)) => {
                return Err(AppError::InvalidInput(
                    "Teacher tokens are not bound to a class".into(),
                ));
            }
            _ => {}
        }

        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            role,
            standard: class.map(|c| c.standard.clone()),
            division: class.map(|c| c.division.clone()),
            exp: (now + Duration::seconds(self.token_expiry)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Auth(format!("Failed to generate token: {}", e)))
    }

    /// Verifies a JWT token and returns the claims.
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| AppError::Auth(format!("Invalid token: {}", e)))?;

        if claims.role == Role::Student && claims.class_scope().is_none() {
            return Err(AppError::Auth(
                "Student token is missing its class".to_string(),
            ));
        }
        Ok(claims)
    }
}
