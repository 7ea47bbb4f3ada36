//! Database abstraction traits
//!
//! [`SubjectStore`] is the only persistence seam the pipelines and handlers
//! see. [`DatabaseProvider`] picks the libsql backend (in-memory, local file,
//! or remote Turso) from configuration.
//!
//! # Example
//!
//! ```rust,ignore
//! use syllabus::db::DatabaseProvider;
//!
//! // Use in-memory database (default for development/testing)
//! let store = DatabaseProvider::Memory.create_store().await?;
//!
//! // Use file-based SQLite
//! let store = DatabaseProvider::SQLite { path: "data/syllabus.db".into() }.create_store().await?;
//! ```

use crate::types::{ClassScope, NewSubject, Result, SubjectRecord, SubjectSummary};
use async_trait::async_trait;
use std::sync::Arc;

/// Database provider configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DatabaseProvider {
    /// In-memory SQLite database (ephemeral, lost on restart)
    #[default]
    Memory,
    /// File-based SQLite database
    SQLite {
        /// Path to the SQLite database file
        path: String,
    },
    /// Remote Turso database (requires network access)
    #[cfg(feature = "turso")]
    Turso {
        /// The Turso database URL (e.g., `libsql://your-db.turso.io`)
        url: String,
        /// Authentication token for the Turso database
        auth_token: String,
    },
}

impl DatabaseProvider {
    /// Resolve a provider from a `[database] url` value.
    ///
    /// `:memory:` selects the in-memory database, `libsql://` and `https://`
    /// URLs select Turso, and anything else is treated as a file path.
    pub fn from_url(url: &str, auth_token: Option<String>) -> Result<Self> {
        let url = url.trim();
        if url.is_empty() || url == ":memory:" {
            return Ok(DatabaseProvider::Memory);
        }

        if url.starts_with("libsql://") || url.starts_with("https://") {
            #[cfg(feature = "turso")]
            {
                return Ok(DatabaseProvider::Turso {
                    url: url.to_string(),
                    auth_token: auth_token.unwrap_or_default(),
                });
            }

            #[cfg(not(feature = "turso"))]
            {
                let _ = auth_token;
                return Err(crate::types::AppError::Internal(format!(
                    "Remote database '{}' requires the `turso` feature",
                    url
                )));
            }
        }

        let path = url.strip_prefix("file:").unwrap_or(url);
        Ok(DatabaseProvider::SQLite {
            path: path.to_string(),
        })
    }

    /// Open the database and make sure the schema exists.
    pub async fn create_store(&self) -> Result<Arc<dyn SubjectStore>> {
        match self {
            DatabaseProvider::Memory => {
                Ok(Arc::new(super::turso::TursoClient::new_memory().await?))
            }
            DatabaseProvider::SQLite { path } => {
                Ok(Arc::new(super::turso::TursoClient::new_local(path).await?))
            }
            #[cfg(feature = "turso")]
            DatabaseProvider::Turso { url, auth_token } => Ok(Arc::new(
                super::turso::TursoClient::new_remote(url.clone(), auth_token.clone()).await?,
            )),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DatabaseProvider::Memory => "memory",
            DatabaseProvider::SQLite { .. } => "sqlite",
            #[cfg(feature = "turso")]
            DatabaseProvider::Turso { .. } => "turso",
        }
    }
}

/// Persistence of subjects and their serialized chunk vectors.
///
/// A subject row is written in a single insert, so it is either fully present
/// (metadata, text and every vector) or absent. Only metadata can change
/// afterwards; vectors are never updated in place. A class holds at most one
/// subject per name.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubjectStore: Send + Sync {
    /// Insert a new subject and return the stored row.
    async fn create_subject(&self, subject: NewSubject) -> Result<SubjectRecord>;

    /// Look up a subject by its public identifier, including its vectors.
    async fn get_subject(&self, subject_id: &str) -> Result<Option<SubjectRecord>>;

    /// A subject owned by `teacher_id`, or `None` if it does not exist or
    /// belongs to someone else.
    async fn get_teacher_subject(
        &self,
        teacher_id: &str,
        subject_id: &str,
    ) -> Result<Option<SubjectSummary>>;

    /// The subject `scope` already has under `name`, if any.
    async fn find_class_subject(
        &self,
        name: &str,
        scope: &ClassScope,
    ) -> Result<Option<SubjectSummary>>;

    /// Rename a teacher's subject or move it to another class, leaving its
    /// text and vectors untouched. Returns `None` if the subject does not
    /// exist or belongs to someone else.
    async fn update_subject(
        &self,
        teacher_id: &str,
        subject_id: &str,
        name: &str,
        scope: &ClassScope,
    ) -> Result<Option<SubjectSummary>>;

    /// Subjects owned by a teacher, newest first.
    async fn list_teacher_subjects(&self, teacher_id: &str) -> Result<Vec<SubjectSummary>>;

    /// Subjects published to a class, newest first.
    async fn list_class_subjects(&self, scope: &ClassScope) -> Result<Vec<SubjectSummary>>;

    /// Delete a teacher's subject with all its chunks. Returns whether a row
    /// was removed.
    async fn delete_subject(&self, teacher_id: &str, subject_id: &str) -> Result<bool>;
}
