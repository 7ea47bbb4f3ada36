use super::traits::SubjectStore;
use crate::types::{
    AppError, ClassScope, NewSubject, Result, SubjectRecord, SubjectSummary,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Builder, Connection, Database, Row};

const SUMMARY_COLUMNS: &str =
    "id, subject_id, name, standard, division, created_at, updated_at";
const RECORD_COLUMNS: &str = "id, subject_id, name, standard, division, created_at, updated_at, \
     teacher_id, content, vectors";

/// libsql-backed subject store.
///
/// Holds a single connection: every `connect()` on an in-memory database opens
/// a fresh, empty database, so the schema and rows must share one.
pub struct TursoClient {
    _db: Database,
    conn: Connection,
}

impl TursoClient {
    /// Ephemeral in-memory database.
    pub async fn new_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open in-memory database: {}", e)))?;
        Self::from_database(db).await
    }

    /// SQLite file on local disk, created if missing.
    pub async fn new_local(path: &str) -> Result<Self> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Database(format!("Failed to create database directory: {}", e))
                })?;
            }
        }

        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database '{}': {}", path, e)))?;
        Self::from_database(db).await
    }

    /// Remote Turso database.
    #[cfg(feature = "turso")]
    pub async fn new_remote(url: String, auth_token: String) -> Result<Self> {
        let db = Builder::new_remote(url, auth_token)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Turso: {}", e)))?;
        Self::from_database(db).await
    }

    async fn from_database(db: Database) -> Result<Self> {
        let conn = db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;

        let client = Self { _db: db, conn };
        client.initialize_schema().await?;
        Ok(client)
    }

    async fn initialize_schema(&self) -> Result<()> {
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS subjects (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    subject_id TEXT UNIQUE NOT NULL,
                    name TEXT NOT NULL,
                    standard TEXT NOT NULL,
                    division TEXT NOT NULL,
                    teacher_id TEXT NOT NULL,
                    content TEXT NOT NULL,
                    vectors TEXT NOT NULL,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL
                )",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create subjects table: {}", e)))?;

        self.conn
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_subjects_teacher ON subjects (teacher_id)",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create teacher index: {}", e)))?;

        self.conn
            .execute(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_subjects_class_name \
                 ON subjects (standard, division, name)",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create class index: {}", e)))?;

        Ok(())
    }

    async fn query_summaries(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<SubjectSummary>> {
        let mut rows = self
            .conn
            .query(sql, params)
            .await
            .map_err(|e| AppError::Database(format!("Failed to query subjects: {}", e)))?;

        let mut subjects = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            subjects.push(summary_from_row(&row)?);
        }
        Ok(subjects)
    }
}

/// Map a failed write, turning a clash on the class/name index into the
/// duplicate-subject error.
fn write_error(action: &str, e: libsql::Error) -> AppError {
    let message = e.to_string();
    if message.contains("UNIQUE constraint failed: subjects.standard") {
        AppError::duplicate_subject()
    } else {
        AppError::Database(format!("Failed to {}: {}", action, message))
    }
}

fn timestamp(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| AppError::Database(format!("Invalid timestamp: {}", millis)))
}

fn summary_from_row(row: &Row) -> Result<SubjectSummary> {
    let db = |e: libsql::Error| AppError::Database(e.to_string());

    Ok(SubjectSummary {
        id: row.get(0).map_err(db)?,
        subject_id: row.get(1).map_err(db)?,
        subject_name: row.get(2).map_err(db)?,
        standard: row.get(3).map_err(db)?,
        division: row.get(4).map_err(db)?,
        created_at: timestamp(row.get(5).map_err(db)?)?,
        updated_at: timestamp(row.get(6).map_err(db)?)?,
    })
}

fn record_from_row(row: &Row) -> Result<SubjectRecord> {
    let db = |e: libsql::Error| AppError::Database(e.to_string());
    let summary = summary_from_row(row)?;

    Ok(SubjectRecord {
        id: summary.id,
        subject_id: summary.subject_id,
        name: summary.subject_name,
        standard: summary.standard,
        division: summary.division,
        teacher_id: row.get(7).map_err(db)?,
        content: row.get(8).map_err(db)?,
        vectors: row.get(9).map_err(db)?,
        created_at: summary.created_at,
        updated_at: summary.updated_at,
    })
}

#[async_trait]
impl SubjectStore for TursoClient {
    async fn create_subject(&self, subject: NewSubject) -> Result<SubjectRecord> {
        let now = Utc::now();
        let millis = now.timestamp_millis();

        // The id comes back from the insert itself: the connection is shared,
        // so a separate last_insert_rowid() may see another request's row.
        let mut rows = self
            .conn
            .query(
                "INSERT INTO subjects
                    (subject_id, name, standard, division, teacher_id, content, vectors, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                 RETURNING id",
                libsql::params![
                    subject.subject_id.as_str(),
                    subject.name.as_str(),
                    subject.standard.as_str(),
                    subject.division.as_str(),
                    subject.teacher_id.as_str(),
                    subject.content.as_str(),
                    subject.vectors.as_str(),
                    millis,
                    millis
                ],
            )
            .await
            .map_err(|e| write_error("create subject", e))?;

        let id: i64 = match rows
            .next()
            .await
            .map_err(|e| write_error("create subject", e))?
        {
            Some(row) => row
                .get(0)
                .map_err(|e| AppError::Database(e.to_string()))?,
            None => {
                return Err(AppError::Database(
                    "Insert returned no subject id".to_string(),
                ))
            }
        };
        let stored = timestamp(millis)?;

        Ok(SubjectRecord {
            id,
            subject_id: subject.subject_id,
            name: subject.name,
            standard: subject.standard,
            division: subject.division,
            teacher_id: subject.teacher_id,
            content: subject.content,
            vectors: subject.vectors,
            created_at: stored,
            updated_at: stored,
        })
    }

    async fn get_subject(&self, subject_id: &str) -> Result<Option<SubjectRecord>> {
        let sql = format!("SELECT {} FROM subjects WHERE subject_id = ?", RECORD_COLUMNS);
        let mut rows = self
            .conn
            .query(&sql, [subject_id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to query subject: {}", e)))?;

        match rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            Some(row) => Ok(Some(record_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_teacher_subject(
        &self,
        teacher_id: &str,
        subject_id: &str,
    ) -> Result<Option<SubjectSummary>> {
        let sql = format!(
            "SELECT {} FROM subjects WHERE teacher_id = ? AND subject_id = ?",
            SUMMARY_COLUMNS
        );
        Ok(self
            .query_summaries(&sql, [teacher_id, subject_id])
            .await?
            .into_iter()
            .next())
    }

    async fn find_class_subject(
        &self,
        name: &str,
        scope: &ClassScope,
    ) -> Result<Option<SubjectSummary>> {
        let sql = format!(
            "SELECT {} FROM subjects WHERE name = ? AND standard = ? AND division = ? LIMIT 1",
            SUMMARY_COLUMNS
        );
        Ok(self
            .query_summaries(&sql, [name, scope.standard.as_str(), scope.division.as_str()])
            .await?
            .into_iter()
            .next())
    }

    async fn update_subject(
        &self,
        teacher_id: &str,
        subject_id: &str,
        name: &str,
        scope: &ClassScope,
    ) -> Result<Option<SubjectSummary>> {
        let sql = format!(
            "UPDATE subjects SET name = ?, standard = ?, division = ?, updated_at = ? \
             WHERE teacher_id = ? AND subject_id = ? RETURNING {}",
            SUMMARY_COLUMNS
        );
        let mut rows = self
            .conn
            .query(
                &sql,
                libsql::params![
                    name,
                    scope.standard.as_str(),
                    scope.division.as_str(),
                    Utc::now().timestamp_millis(),
                    teacher_id,
                    subject_id
                ],
            )
            .await
            .map_err(|e| write_error("update subject", e))?;

        match rows
            .next()
            .await
            .map_err(|e| write_error("update subject", e))?
        {
            Some(row) => Ok(Some(summary_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_teacher_subjects(&self, teacher_id: &str) -> Result<Vec<SubjectSummary>> {
        let sql = format!(
            "SELECT {} FROM subjects WHERE teacher_id = ? ORDER BY created_at DESC, id DESC",
            SUMMARY_COLUMNS
        );
        self.query_summaries(&sql, [teacher_id]).await
    }

    async fn list_class_subjects(&self, scope: &ClassScope) -> Result<Vec<SubjectSummary>> {
        let sql = format!(
            "SELECT {} FROM subjects WHERE standard = ? AND division = ? \
             ORDER BY created_at DESC, id DESC",
            SUMMARY_COLUMNS
        );
        self.query_summaries(&sql, [scope.standard.as_str(), scope.division.as_str()])
            .await
    }

    async fn delete_subject(&self, teacher_id: &str, subject_id: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute(
                "DELETE FROM subjects WHERE teacher_id = ? AND subject_id = ?",
                [teacher_id, subject_id],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete subject: {}", e)))?;

        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_subject(subject_id: &str, teacher_id: &str, standard: &str, division: &str) -> NewSubject {
        NewSubject {
            subject_id: subject_id.to_string(),
            name: format!("Subject {}", subject_id),
            standard: standard.to_string(),
            division: division.to_string(),
            teacher_id: teacher_id.to_string(),
            content: "raw text".to_string(),
            vectors: r#"[{"text":"raw text","embedding":[1.0,0.0]}]"#.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_round_trip() {
        let client = TursoClient::new_memory().await.unwrap();

        let created = client
            .create_subject(new_subject("s-1", "t-1", "10", "A"))
            .await
            .unwrap();
        let fetched = client.get_subject("s-1").await.unwrap().unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.teacher_id, "t-1");
        assert!(client.get_subject("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_public_id_rejected() {
        let client = TursoClient::new_memory().await.unwrap();
        client
            .create_subject(new_subject("s-1", "t-1", "10", "A"))
            .await
            .unwrap();

        let err = client
            .create_subject(new_subject("s-1", "t-2", "9", "B"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_listing_scoped_and_newest_first() {
        let client = TursoClient::new_memory().await.unwrap();
        for (id, teacher, standard, division) in [
            ("s-1", "t-1", "10", "A"),
            ("s-2", "t-1", "10", "B"),
            ("s-3", "t-2", "10", "A"),
        ] {
            client
                .create_subject(new_subject(id, teacher, standard, division))
                .await
                .unwrap();
        }

        let own: Vec<String> = client
            .list_teacher_subjects("t-1")
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.subject_id)
            .collect();
        assert_eq!(own, vec!["s-2", "s-1"]);

        let class: Vec<String> = client
            .list_class_subjects(&ClassScope::new("10", "A"))
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.subject_id)
            .collect();
        assert_eq!(class, vec!["s-3", "s-1"]);
    }

    #[tokio::test]
    async fn test_same_name_in_same_class_is_duplicate() {
        let client = TursoClient::new_memory().await.unwrap();
        let mut first = new_subject("s-1", "t-1", "10", "A");
        first.name = "Biology".into();
        client.create_subject(first).await.unwrap();

        let mut other_class = new_subject("s-2", "t-1", "10", "B");
        other_class.name = "Biology".into();
        client.create_subject(other_class).await.unwrap();

        let mut clash = new_subject("s-3", "t-2", "10", "A");
        clash.name = "Biology".into();
        let err = client.create_subject(clash).await.unwrap_err();
        assert!(
            matches!(err, AppError::InvalidInput(ref m) if m.contains("already exists")),
            "{:?}",
            err
        );

        let found = client
            .find_class_subject("Biology", &ClassScope::new("10", "A"))
            .await
            .unwrap()
            .expect("existing subject");
        assert_eq!(found.subject_id, "s-1");
        assert!(client
            .find_class_subject("Biology", &ClassScope::new("9", "A"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_changes_metadata_only() {
        let client = TursoClient::new_memory().await.unwrap();
        let created = client
            .create_subject(new_subject("s-1", "t-1", "10", "A"))
            .await
            .unwrap();

        let updated = client
            .update_subject("t-1", "s-1", "Physics II", &ClassScope::new("11", "C"))
            .await
            .unwrap()
            .expect("owner can update");
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.subject_name, "Physics II");
        assert_eq!(updated.standard, "11");
        assert_eq!(updated.division, "C");
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.created_at, created.created_at);

        let record = client.get_subject("s-1").await.unwrap().unwrap();
        assert_eq!(record.content, created.content);
        assert_eq!(record.vectors, created.vectors);
        assert_eq!(record.teacher_id, "t-1");
    }

    #[tokio::test]
    async fn test_update_requires_owner() {
        let client = TursoClient::new_memory().await.unwrap();
        client
            .create_subject(new_subject("s-1", "t-1", "10", "A"))
            .await
            .unwrap();

        let result = client
            .update_subject("t-2", "s-1", "Stolen", &ClassScope::new("10", "A"))
            .await
            .unwrap();
        assert!(result.is_none());
        assert_eq!(client.get_subject("s-1").await.unwrap().unwrap().name, "Subject s-1");
    }

    #[tokio::test]
    async fn test_update_into_taken_name_is_duplicate() {
        let client = TursoClient::new_memory().await.unwrap();
        client
            .create_subject(new_subject("s-1", "t-1", "10", "A"))
            .await
            .unwrap();
        client
            .create_subject(new_subject("s-2", "t-1", "10", "A"))
            .await
            .unwrap();

        let err = client
            .update_subject("t-1", "s-2", "Subject s-1", &ClassScope::new("10", "A"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_delete_only_own_subject() {
        let client = TursoClient::new_memory().await.unwrap();
        client
            .create_subject(new_subject("s-1", "t-1", "10", "A"))
            .await
            .unwrap();

        assert!(client.get_teacher_subject("t-2", "s-1").await.unwrap().is_none());
        assert!(!client.delete_subject("t-2", "s-1").await.unwrap());
        assert!(client.delete_subject("t-1", "s-1").await.unwrap());
        assert!(client.get_subject("s-1").await.unwrap().is_none());
    }
}
