//! # Syllabus
//!
//! A classroom retrieval-augmented generation server. Teachers upload subject
//! material, which is split into fixed-size chunks, embedded and stored with
//! the subject. Students ask questions about a subject of their class; the
//! question is embedded, the closest chunks are retrieved by cosine
//! similarity and a generation model answers from them.
//!
//! ## Overview
//!
//! Syllabus can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `syllabus-server` binary
//! 2. **As a library** - Drive the pipelines from your own code
//!
//! ### Library Example
//!
//! ```rust,ignore
//! use syllabus::{IngestionPipeline, QueryPipeline, TextChunker, TursoClient};
//! use syllabus::rag::EmbeddingProvider;
//! use syllabus::llm::Provider;
//! use std::{sync::Arc, time::Duration};
//!
//! let store = Arc::new(TursoClient::new_memory().await?);
//! let embedder = EmbeddingProvider::Ollama {
//!     base_url: "http://localhost:11434".into(),
//!     model: "nomic-embed-text".into(),
//! }
//! .create_embedder(Duration::from_secs(30))?;
//! let llm = Provider::Ollama {
//!     base_url: "http://localhost:11434".into(),
//!     model: "llama3.2".into(),
//!     temperature: None,
//! }
//! .create_client(Duration::from_secs(120))?;
//!
//! let ingestion = IngestionPipeline::new(
//!     embedder.clone(), store.clone(), TextChunker::default(), 4, Duration::from_secs(30),
//! );
//! let summary = ingestion.ingest(meta, &text).await?;
//!
//! let query = QueryPipeline::new(
//!     embedder, llm, store, Duration::from_secs(30), Duration::from_secs(120),
//! );
//! let answer = query.query(&summary.subject_id, "What is inertia?", None).await?;
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ollama` | Ollama embeddings and chat (default) |
//! | `openai` | OpenAI-compatible chat completions (default) |
//! | `turso` | Remote Turso database |
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`auth`] - JWT verification and role extractors
//! - [`cli`] - Command-line interface
//! - [`db`] - Subject storage (libsql / Turso)
//! - [`llm`] - Generation clients
//! - [`rag`] - Chunking, embedding, retrieval and the two pipelines
//! - [`types`] - Common types and error handling
//! - [`utils`] - Configuration

#![cfg_attr(docsrs, feature(doc_cfg))]

/// HTTP API handlers and routes.
pub mod api;
/// JWT authentication and middleware.
pub mod auth;
/// Command-line interface.
pub mod cli;
/// Subject storage.
pub mod db;
/// Generation provider clients.
pub mod llm;
/// Retrieval Augmented Generation (RAG) components.
pub mod rag;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

pub use db::{SubjectStore, TursoClient};
pub use llm::{LLMClient, Provider};
pub use rag::{Embedder, IngestionPipeline, QueryPipeline, TextChunker};
pub use types::{AppError, Result};
pub use utils::toml_config::SyllabusConfig;

use crate::auth::jwt::AuthService;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Configuration loaded at startup
    pub config: Arc<SyllabusConfig>,
    /// Subject storage
    pub store: Arc<dyn SubjectStore>,
    /// Document ingestion pipeline
    pub ingestion: Arc<IngestionPipeline>,
    /// Question answering pipeline
    pub query: Arc<QueryPipeline>,
    /// Authentication service
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    /// Wire the pipelines from already constructed capabilities.
    pub fn new(
        config: SyllabusConfig,
        store: Arc<dyn SubjectStore>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LLMClient>,
        auth_service: AuthService,
    ) -> Result<Self> {
        let chunker = TextChunker::new(config.rag.chunk_size)?;

        let ingestion = IngestionPipeline::new(
            embedder.clone(),
            store.clone(),
            chunker,
            config.rag.embed_concurrency,
            config.embedding.timeout(),
        );

        let query = QueryPipeline::new(
            embedder,
            llm,
            store.clone(),
            config.embedding.timeout(),
            config.generation.timeout(),
        )
        .with_top_k(config.rag.top_k)
        .with_max_prompt_chars(config.rag.max_prompt_chars);

        Ok(Self {
            config: Arc::new(config),
            store,
            ingestion: Arc::new(ingestion),
            query: Arc::new(query),
            auth_service: Arc::new(auth_service),
        })
    }

    /// Open the configured database and providers, then wire the pipelines.
    pub async fn from_config(config: SyllabusConfig) -> Result<Self> {
        let config_err = |e: utils::toml_config::ConfigError| AppError::Internal(e.to_string());

        let database = config.database_provider().map_err(config_err)?;
        let embedding = config.embedding_provider().map_err(config_err)?;
        let generation = config.generation_provider().map_err(config_err)?;

        let store = database.create_store().await?;
        let embedder = embedding.create_embedder(config.embedding.timeout())?;
        let llm = generation.create_client(config.generation.timeout())?;
        let auth_service =
            AuthService::new(config.jwt_secret().map_err(config_err)?, config.auth.token_expiry);

        tracing::info!(
            database = database.name(),
            embedding_provider = embedding.name(),
            embedding_model = %embedder.model_name(),
            generation_provider = generation.name(),
            generation_model = generation.model(),
            "Providers ready"
        );

        Self::new(config, store, embedder, llm, auth_service)
    }

    /// The HTTP router for this state.
    pub fn router(self) -> axum::Router {
        api::routes::create_router(self)
    }
}
