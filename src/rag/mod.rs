//! Retrieval Augmented Generation (RAG) Pipeline
//!
//! Everything needed to turn an uploaded document into searchable subject
//! material and to answer student questions from it.
//!
//! # Module Structure
//!
//! - [`rag::chunker`](crate::rag::chunker) - Fixed-size whitespace token windows
//! - [`rag::embeddings`](crate::rag::embeddings) - Embedding providers (OpenAI-compatible, Ollama)
//! - [`rag::vectors`](crate::rag::vectors) - Stored `{text, embedding}` layout
//! - [`rag::search`](crate::rag::search) - Cosine similarity and top-K selection
//! - [`rag::prompt`](crate::rag::prompt) - Generation request assembly
//! - [`rag::upload`](crate::rag::upload) - Temporary upload files and text extraction
//! - [`rag::ingestion`](crate::rag::ingestion) - Chunk → embed → persist
//! - [`rag::query`](crate::rag::query) - Embed → retrieve → assemble → generate
//!
//! # RAG Pipeline
//!
//! 1. **Ingestion** - A teacher's document is chunked and every chunk embedded
//! 2. **Storage** - Chunks and vectors are stored on the subject row, in order
//! 3. **Retrieval** - A student question is embedded and the closest chunks picked
//! 4. **Generation** - The LLM answers from the retrieved context
//!
//! # Example
//!
//! ```ignore
//! use syllabus::rag::{IngestionPipeline, QueryPipeline};
//!
//! let summary = ingestion.ingest(meta, &document_text).await?;
//! let answer = query.query(&summary.subject_id, "What is osmosis?", None).await?;
//! println!("{}", answer.response);
//! ```

pub mod chunker;
pub mod embeddings;
pub mod ingestion;
pub mod prompt;
pub mod query;
pub mod search;
pub mod upload;
pub mod vectors;

pub use chunker::TextChunker;
pub use embeddings::{Embedder, EmbeddingProvider};
pub use ingestion::IngestionPipeline;
pub use query::QueryPipeline;
pub use upload::{DocumentKind, UploadedDocument};
