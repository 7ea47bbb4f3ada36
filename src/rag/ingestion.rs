//! Document ingestion: chunk, embed, persist.

use super::chunker::TextChunker;
use super::embeddings::Embedder;
use super::upload::UploadedDocument;
use super::vectors::{self, VectorRecord};
use crate::db::SubjectStore;
use crate::types::{AppError, ClassScope, NewSubject, Result, SubjectMeta, SubjectSummary};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Turns a document into a persisted subject with one embedding per chunk.
///
/// Embedding calls run concurrently up to `concurrency` at a time. Results are
/// tagged with their chunk index and written back in chunk order, so the
/// stored list is index-aligned whatever order the provider answers in. The
/// subject row is only written once every chunk has a vector, and never for a
/// name its class already uses.
#[derive(Clone)]
pub struct IngestionPipeline {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn SubjectStore>,
    chunker: TextChunker,
    concurrency: usize,
    embed_timeout: Duration,
}

impl IngestionPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn SubjectStore>,
        chunker: TextChunker,
        concurrency: usize,
        embed_timeout: Duration,
    ) -> Self {
        Self {
            embedder,
            store,
            chunker,
            concurrency: concurrency.max(1),
            embed_timeout,
        }
    }

    /// Extract the upload's text and ingest it.
    ///
    /// The temporary file is released as soon as the text is in memory, and in
    /// any case before this returns.
    pub async fn ingest_document(
        &self,
        meta: SubjectMeta,
        upload: UploadedDocument,
    ) -> Result<SubjectSummary> {
        validate_meta(&meta)?;
        self.ensure_unique(&meta).await?;

        let text = upload.extract_text().await;
        tracing::debug!(path = %upload.path().display(), bytes = upload.size(), "Releasing upload");
        drop(upload);

        self.ingest_text(meta, &text?).await
    }

    /// Chunk, embed and persist `text` as a new subject.
    pub async fn ingest(&self, meta: SubjectMeta, text: &str) -> Result<SubjectSummary> {
        validate_meta(&meta)?;
        if text.trim().is_empty() {
            return Err(AppError::EmptyDocument);
        }
        self.ensure_unique(&meta).await?;

        self.ingest_text(meta, text).await
    }

    /// A class holds one subject per name; checked before any embedding call.
    async fn ensure_unique(&self, meta: &SubjectMeta) -> Result<()> {
        let scope = ClassScope::new(meta.standard.clone(), meta.division.clone());
        match self.store.find_class_subject(&meta.name, &scope).await? {
            Some(existing) => {
                tracing::debug!(
                    subject = %meta.name,
                    existing = %existing.subject_id,
                    "Subject name already used in this class"
                );
                Err(AppError::duplicate_subject())
            }
            None => Ok(()),
        }
    }

    async fn ingest_text(&self, meta: SubjectMeta, text: &str) -> Result<SubjectSummary> {
        if text.trim().is_empty() {
            return Err(AppError::EmptyDocument);
        }

        let start = Instant::now();
        let chunks = self.chunker.chunk(text);
        if chunks.is_empty() {
            return Err(AppError::EmptyDocument);
        }

        tracing::info!(
            subject = %meta.name,
            chunks = chunks.len(),
            chunk_size = self.chunker.chunk_size(),
            concurrency = self.concurrency,
            model = %self.embedder.model_name(),
            "Embedding document"
        );

        let records = self.embed_chunks(chunks).await?;
        let blob = vectors::encode(&records)?;

        let record = self
            .store
            .create_subject(NewSubject {
                subject_id: uuid::Uuid::new_v4().to_string(),
                name: meta.name,
                standard: meta.standard,
                division: meta.division,
                teacher_id: meta.teacher_id,
                content: text.to_string(),
                vectors: blob,
            })
            .await?;

        tracing::info!(
            subject_id = %record.subject_id,
            chunks = records.len(),
            dimensions = records[0].embedding.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Subject ingested"
        );

        Ok(record.summary())
    }

    async fn embed_chunks(&self, chunks: Vec<String>) -> Result<Vec<VectorRecord>> {
        let mut slots: Vec<Option<Vec<f32>>> = vec![None; chunks.len()];
        let mut dimensions: Option<usize> = None;

        let embedder = self.embedder.clone();
        let timeout = self.embed_timeout;
        let mut results = stream::iter(chunks.iter().cloned().enumerate())
            .map(move |(index, text)| {
                let embedder = embedder.clone();
                async move { (index, embed_one(embedder, text, timeout).await) }
            })
            .buffer_unordered(self.concurrency);

        // Returning early drops the stream, cancelling the calls still in flight.
        while let Some((index, result)) = results.next().await {
            let embedding = result.inspect_err(|e| {
                tracing::warn!(chunk = index, error = %e, "Chunk embedding failed, aborting ingestion");
            })?;

            match dimensions {
                None => dimensions = Some(embedding.len()),
                Some(expected) if expected != embedding.len() => {
                    return Err(AppError::UpstreamEmbedding(format!(
                        "Provider returned {} dimensions for chunk {}, expected {}",
                        embedding.len(),
                        index,
                        expected
                    )));
                }
                Some(_) => {}
            }

            slots[index] = Some(embedding);
        }
        drop(results);

        chunks
            .into_iter()
            .zip(slots)
            .enumerate()
            .map(|(index, (text, slot))| {
                slot.map(|embedding| VectorRecord { text, embedding })
                    .ok_or_else(|| {
                        AppError::Internal(format!("Missing embedding for chunk {}", index))
                    })
            })
            .collect()
    }
}

async fn embed_one(embedder: Arc<dyn Embedder>, text: String, timeout: Duration) -> Result<Vec<f32>> {
    match tokio::time::timeout(timeout, embedder.embed(&text)).await {
        Ok(Ok(embedding)) => Ok(embedding),
        Ok(Err(e)) => Err(as_upstream_embedding(e)),
        Err(_) => Err(AppError::UpstreamEmbedding(format!(
            "Embedding request timed out after {}ms",
            timeout.as_millis()
        ))),
    }
}

/// Any failure of the embedding capability is an upstream embedding error.
pub(crate) fn as_upstream_embedding(err: AppError) -> AppError {
    match err {
        AppError::UpstreamEmbedding(_) => err,
        other => AppError::UpstreamEmbedding(other.to_string()),
    }
}

fn validate_meta(meta: &SubjectMeta) -> Result<()> {
    let fields = [
        ("Subject name", &meta.name),
        ("Standard", &meta.standard),
        ("Division", &meta.division),
        ("Teacher id", &meta.teacher_id),
    ];

    for (label, value) in fields {
        if value.trim().is_empty() {
            return Err(AppError::InvalidInput(format!("{} is required", label)));
        }
    }
    Ok(())
}
