//! Question answering over an ingested subject.

use super::embeddings::Embedder;
use super::ingestion::as_upstream_embedding;
use super::{prompt, search, vectors};
use crate::db::SubjectStore;
use crate::llm::client::as_upstream_generation;
use crate::llm::LLMClient;
use crate::types::{AppError, ChatMessage, ChatResponse, ClassScope, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default number of chunks handed to the generation model.
pub const DEFAULT_TOP_K: usize = 3;
/// Default upper bound on prompt length, in characters.
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 1000;

/// Embeds a question, retrieves the closest chunks of one subject and asks the
/// generation model to answer from them.
#[derive(Clone)]
pub struct QueryPipeline {
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn LLMClient>,
    store: Arc<dyn SubjectStore>,
    top_k: usize,
    max_prompt_chars: usize,
    embed_timeout: Duration,
    generate_timeout: Duration,
}

impl QueryPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LLMClient>,
        store: Arc<dyn SubjectStore>,
        embed_timeout: Duration,
        generate_timeout: Duration,
    ) -> Self {
        Self {
            embedder,
            llm,
            store,
            top_k: DEFAULT_TOP_K,
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
            embed_timeout,
            generate_timeout,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn with_max_prompt_chars(mut self, max_prompt_chars: usize) -> Self {
        self.max_prompt_chars = max_prompt_chars;
        self
    }

    /// Answer `prompt` from the material of `subject_id`.
    ///
    /// When `scope` is given the subject must belong to that class; a subject
    /// of another class is reported exactly like a missing one. All validation
    /// and lookups happen before any upstream call.
    pub async fn query(
        &self,
        subject_id: &str,
        prompt: &str,
        scope: Option<&ClassScope>,
    ) -> Result<ChatResponse> {
        self.validate(subject_id, prompt)?;
        let start = Instant::now();

        let subject = self
            .store
            .get_subject(subject_id)
            .await?
            .filter(|subject| scope.is_none_or(|scope| subject.scope() == *scope))
            .ok_or_else(|| AppError::SubjectNotFound("Subject not found".to_string()))?;

        let chunks = vectors::decode(&subject.vectors).inspect_err(|e| {
            tracing::error!(subject_id = %subject.subject_id, error = %e, "Stored vectors are unreadable");
        })?;
        let stored_dims = vectors::dimensions(&chunks).unwrap_or_default();

        let query_vector = self.embed_query(prompt).await?;
        if query_vector.len() != stored_dims {
            return Err(AppError::UpstreamEmbedding(format!(
                "Query embedding has {} dimensions but subject vectors have {}; was the embedding model changed?",
                query_vector.len(),
                stored_dims
            )));
        }

        let retrieved = search::top_k(&chunks, &query_vector, self.top_k);
        tracing::debug!(
            subject_id = %subject.subject_id,
            retrieved = ?retrieved.iter().map(|c| (c.index, c.similarity)).collect::<Vec<_>>(),
            "Retrieved context"
        );

        let messages = prompt::assemble(&retrieved, prompt);
        let response = self.generate(&messages).await?;

        tracing::info!(
            subject_id = %subject.subject_id,
            chunks = chunks.len(),
            context_chunks = retrieved.len(),
            model = %self.llm.model_name(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Answered question"
        );

        Ok(ChatResponse {
            response,
            subject_id: subject.subject_id,
            subject_name: subject.name,
        })
    }

    fn validate(&self, subject_id: &str, prompt: &str) -> Result<()> {
        if subject_id.trim().is_empty() {
            return Err(AppError::InvalidInput("Subject ID is required".to_string()));
        }
        if uuid::Uuid::parse_str(subject_id).is_err() {
            return Err(AppError::InvalidInput(
                "Subject ID must be a valid UUID".to_string(),
            ));
        }

        if prompt.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Prompt is required and cannot be only whitespace".to_string(),
            ));
        }
        let chars = prompt.chars().count();
        if chars > self.max_prompt_chars {
            return Err(AppError::InvalidInput(format!(
                "Prompt must be between 1 and {} characters (got {})",
                self.max_prompt_chars, chars
            )));
        }
        Ok(())
    }

    async fn embed_query(&self, prompt: &str) -> Result<Vec<f32>> {
        match tokio::time::timeout(self.embed_timeout, self.embedder.embed(prompt)).await {
            Ok(result) => result.map_err(as_upstream_embedding),
            Err(_) => Err(AppError::UpstreamEmbedding(format!(
                "Embedding request timed out after {}ms",
                self.embed_timeout.as_millis()
            ))),
        }
    }

    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        match tokio::time::timeout(self.generate_timeout, self.llm.generate_with_history(messages))
            .await
        {
            Ok(result) => result.map_err(as_upstream_generation),
            Err(_) => Err(AppError::UpstreamGeneration(format!(
                "Generation request timed out after {}ms",
                self.generate_timeout.as_millis()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockSubjectStore;
    use crate::llm::MockLLMClient;
    use crate::rag::vectors::VectorRecord;
    use crate::types::{MessageRole, SubjectRecord};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SUBJECT_ID: &str = "6f1c2b8e-2d7a-4c52-9a57-1f0f1c3d9e10";

    struct FixedEmbedder {
        vector: Vec<f32>,
        calls: AtomicUsize,
    }

    impl FixedEmbedder {
        fn new(vector: Vec<f32>) -> Arc<Self> {
            Arc::new(Self {
                vector,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.vector.clone())
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    fn subject(vectors: String) -> SubjectRecord {
        let now = Utc::now();
        SubjectRecord {
            id: 7,
            subject_id: SUBJECT_ID.to_string(),
            name: "Physics".into(),
            standard: "9".into(),
            division: "B".into(),
            teacher_id: "t-1".into(),
            content: "raw".into(),
            vectors,
            created_at: now,
            updated_at: now,
        }
    }

    fn blob() -> String {
        vectors::encode(&[
            VectorRecord {
                text: "Newton's first law.".into(),
                embedding: vec![1.0, 0.0],
            },
            VectorRecord {
                text: "Ohm's law.".into(),
                embedding: vec![0.0, 1.0],
            },
        ])
        .unwrap()
    }

    fn store_with(record: Option<SubjectRecord>) -> MockSubjectStore {
        let mut store = MockSubjectStore::new();
        store
            .expect_get_subject()
            .returning(move |_| Ok(record.clone()));
        store
    }

    fn pipeline(
        embedder: Arc<FixedEmbedder>,
        llm: MockLLMClient,
        store: MockSubjectStore,
    ) -> QueryPipeline {
        QueryPipeline::new(
            embedder,
            Arc::new(llm),
            Arc::new(store),
            Duration::from_secs(5),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_answers_with_subject_identity() {
        let mut llm = MockLLMClient::new();
        llm.expect_model_name().return_const("mock".to_string());
        llm.expect_generate_with_history()
            .withf(|messages: &[ChatMessage]| {
                messages.len() == 2
                    && messages[0].role == MessageRole::System
                    && messages[0].content.ends_with("Newton's first law.\n\nOhm's law.")
                    && messages[1].content == "What is inertia?"
            })
            .times(1)
            .returning(|_| Ok("Inertia is resistance to change in motion.".to_string()));

        let pipeline = pipeline(
            FixedEmbedder::new(vec![0.9, 0.1]),
            llm,
            store_with(Some(subject(blob()))),
        );

        let answer = pipeline
            .query(SUBJECT_ID, "What is inertia?", None)
            .await
            .unwrap();
        assert_eq!(answer.subject_id, SUBJECT_ID);
        assert_eq!(answer.subject_name, "Physics");
        assert!(answer.response.starts_with("Inertia"));
    }

    #[tokio::test]
    async fn test_unknown_subject_makes_no_upstream_call() {
        let embedder = FixedEmbedder::new(vec![1.0, 0.0]);
        let mut llm = MockLLMClient::new();
        llm.expect_generate_with_history().never();

        let pipeline = pipeline(embedder.clone(), llm, store_with(None));
        let err = pipeline.query(SUBJECT_ID, "hello", None).await.unwrap_err();

        assert!(matches!(err, AppError::SubjectNotFound(_)));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_other_class_is_not_found() {
        let embedder = FixedEmbedder::new(vec![1.0, 0.0]);
        let mut llm = MockLLMClient::new();
        llm.expect_generate_with_history().never();

        let pipeline = pipeline(embedder.clone(), llm, store_with(Some(subject(blob()))));
        let scope = ClassScope::new("10", "B");
        let err = pipeline
            .query(SUBJECT_ID, "hello", Some(&scope))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::SubjectNotFound(_)));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_overlong_prompt_rejected_before_lookup() {
        let embedder = FixedEmbedder::new(vec![1.0, 0.0]);
        let mut store = MockSubjectStore::new();
        store.expect_get_subject().never();
        let mut llm = MockLLMClient::new();
        llm.expect_generate_with_history().never();

        let pipeline = pipeline(embedder.clone(), llm, store);
        let prompt = "a".repeat(1001);
        let err = pipeline.query(SUBJECT_ID, &prompt, None).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_prompt_length_counts_characters() {
        let mut llm = MockLLMClient::new();
        llm.expect_model_name().return_const("mock".to_string());
        llm.expect_generate_with_history()
            .returning(|_| Ok("ok".to_string()));

        let pipeline = pipeline(
            FixedEmbedder::new(vec![1.0, 0.0]),
            llm,
            store_with(Some(subject(blob()))),
        );
        // 1000 multi-byte characters is within bounds.
        let prompt = "é".repeat(1000);
        assert!(pipeline.query(SUBJECT_ID, &prompt, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_whitespace_prompt_rejected_with_reason() {
        let mut store = MockSubjectStore::new();
        store.expect_get_subject().never();
        let embedder = FixedEmbedder::new(vec![1.0, 0.0]);
        let pipeline = pipeline(embedder.clone(), MockLLMClient::new(), store);

        let err = pipeline.query(SUBJECT_ID, " \n\t ", None).await.unwrap_err();

        assert!(
            matches!(err, AppError::InvalidInput(ref m) if m.contains("only whitespace")),
            "{:?}",
            err
        );
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_uuid_subject_id_rejected() {
        let mut store = MockSubjectStore::new();
        store.expect_get_subject().never();
        let pipeline = pipeline(
            FixedEmbedder::new(vec![1.0]),
            MockLLMClient::new(),
            store,
        );

        let err = pipeline.query("42", "hello", None).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_corrupt_vectors_reported() {
        let mut llm = MockLLMClient::new();
        llm.expect_generate_with_history().never();
        let embedder = FixedEmbedder::new(vec![1.0, 0.0]);

        let pipeline = pipeline(
            embedder.clone(),
            llm,
            store_with(Some(subject("{oops".to_string()))),
        );
        let err = pipeline.query(SUBJECT_ID, "hello", None).await.unwrap_err();

        assert!(matches!(err, AppError::CorruptVectorData(_)));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_query_dimension_mismatch_fails_fast() {
        let mut llm = MockLLMClient::new();
        llm.expect_generate_with_history().never();

        let pipeline = pipeline(
            FixedEmbedder::new(vec![1.0, 0.0, 0.0]),
            llm,
            store_with(Some(subject(blob()))),
        );
        let err = pipeline.query(SUBJECT_ID, "hello", None).await.unwrap_err();
        assert!(matches!(err, AppError::UpstreamEmbedding(ref m) if m.contains("dimensions")));
    }

    #[tokio::test]
    async fn test_generation_failure_is_upstream_error() {
        let mut llm = MockLLMClient::new();
        llm.expect_generate_with_history()
            .returning(|_| Err(AppError::Internal("connection reset".into())));

        let pipeline = pipeline(
            FixedEmbedder::new(vec![1.0, 0.0]),
            llm,
            store_with(Some(subject(blob()))),
        );
        let err = pipeline.query(SUBJECT_ID, "hello", None).await.unwrap_err();
        assert!(matches!(err, AppError::UpstreamGeneration(ref m) if m.contains("connection reset")));
    }
}
