#![allow(dead_code)]

pub mod mocks;

use mocks::{MockEmbedder, MockLLMClient};
use std::sync::Arc;
use std::time::Duration;
use syllabus::types::SubjectMeta;
use syllabus::{IngestionPipeline, QueryPipeline, TextChunker, TursoClient};

pub const TIMEOUT: Duration = Duration::from_secs(5);

pub fn meta(name: &str, standard: &str, division: &str, teacher_id: &str) -> SubjectMeta {
    SubjectMeta {
        name: name.to_string(),
        standard: standard.to_string(),
        division: division.to_string(),
        teacher_id: teacher_id.to_string(),
    }
}

/// `n` distinct words, so the chunk count of a document is predictable.
pub fn words(n: usize) -> String {
    (0..n)
        .map(|i| format!("w{}", i))
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct Pipelines {
    pub store: Arc<TursoClient>,
    pub embedder: Arc<MockEmbedder>,
    pub llm: MockLLMClient,
    pub ingestion: IngestionPipeline,
    pub query: QueryPipeline,
}

pub async fn pipelines(embedder: MockEmbedder, llm: MockLLMClient, chunk_size: usize) -> Pipelines {
    pipelines_with(embedder, llm, chunk_size, 4, TIMEOUT).await
}

/// Pipelines with an explicit embedding concurrency and one timeout for
/// every upstream call.
pub async fn pipelines_with(
    embedder: MockEmbedder,
    llm: MockLLMClient,
    chunk_size: usize,
    concurrency: usize,
    timeout: Duration,
) -> Pipelines {
    let store = Arc::new(TursoClient::new_memory().await.expect("in-memory store"));
    let embedder = Arc::new(embedder);

    let ingestion = IngestionPipeline::new(
        embedder.clone(),
        store.clone(),
        TextChunker::new(chunk_size).expect("chunk size"),
        concurrency,
        timeout,
    );
    let query = QueryPipeline::new(
        embedder.clone(),
        Arc::new(llm.clone()),
        store.clone(),
        timeout,
        timeout,
    );

    Pipelines {
        store,
        embedder,
        llm,
        ingestion,
        query,
    }
}
