//! TOML-based configuration for Syllabus
//!
//! Infrastructure settings (server, auth, database) and the embedding,
//! generation and retrieval settings are read once at startup from
//! `syllabus.toml`. Secrets never appear in the file: it names the
//! environment variables that hold them.

use crate::db::DatabaseProvider;
use crate::llm::Provider;
use crate::rag::embeddings::EmbeddingProvider;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure loaded from syllabus.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyllabusConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    /// Embedding provider used for both ingestion and queries
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Generation provider used to answer questions
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Chunking and retrieval settings
    #[serde(default)]
    pub rag: RagConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Largest accepted upload, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

// ============= Authentication Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Environment variable name containing the JWT secret
    #[serde(default = "default_jwt_secret_env")]
    pub jwt_secret_env: String,

    /// Token validity, in seconds
    #[serde(default = "default_token_expiry")]
    pub token_expiry: i64,
}

fn default_jwt_secret_env() -> String {
    "JWT_SECRET".to_string()
}

fn default_token_expiry() -> i64 {
    86400
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret_env: default_jwt_secret_env(),
            token_expiry: default_token_expiry(),
        }
    }
}

// ============= Database Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Local database path, `:memory:`, or a `libsql://` URL
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Environment variable for Turso URL (overrides `url` when set)
    pub turso_url_env: Option<String>,

    /// Environment variable for Turso auth token
    pub turso_token_env: Option<String>,
}

fn default_database_url() -> String {
    "./data/syllabus.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            turso_url_env: None,
            turso_token_env: None,
        }
    }
}

// ============= Provider Configuration =============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Ollama,
    OpenAI,
}

impl ProviderKind {
    fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "http://localhost:11434",
            ProviderKind::OpenAI => "https://api.openai.com/v1",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: ProviderKind,

    /// Provider base URL; defaults per provider
    pub base_url: Option<String>,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Environment variable holding the API key (OpenAI-compatible only)
    pub api_key_env: Option<String>,

    /// Requested output dimensionality, for models that support it
    pub dimensions: Option<usize>,

    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_embedding_timeout() -> u64 {
    30
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            base_url: None,
            model: default_embedding_model(),
            api_key_env: None,
            dimensions: None,
            timeout_secs: default_embedding_timeout(),
        }
    }
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub provider: ProviderKind,

    /// Provider base URL; defaults per provider
    pub base_url: Option<String>,

    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Environment variable holding the API key (OpenAI-compatible only)
    pub api_key_env: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

fn default_generation_model() -> String {
    "llama3.2".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_generation_timeout() -> u64 {
    120
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            base_url: None,
            model: default_generation_model(),
            api_key_env: None,
            temperature: default_temperature(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ============= RAG Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Chunk window, in whitespace-separated tokens
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Chunks handed to the generation model per question
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Embedding calls in flight per ingestion
    #[serde(default = "default_embed_concurrency")]
    pub embed_concurrency: usize,

    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,
}

fn default_chunk_size() -> usize {
    crate::rag::chunker::DEFAULT_CHUNK_SIZE
}

fn default_top_k() -> usize {
    crate::rag::query::DEFAULT_TOP_K
}

fn default_embed_concurrency() -> usize {
    4
}

fn default_max_prompt_chars() -> usize {
    crate::rag::query::DEFAULT_MAX_PROMPT_CHARS
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            top_k: default_top_k(),
            embed_concurrency: default_embed_concurrency(),
            max_prompt_chars: default_max_prompt_chars(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

impl SyllabusConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Parse without validating.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Validate value ranges and the availability of referenced env vars
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("rag.chunk_size", self.rag.chunk_size),
            ("rag.top_k", self.rag.top_k),
            ("rag.embed_concurrency", self.rag.embed_concurrency),
            ("rag.max_prompt_chars", self.rag.max_prompt_chars),
            ("server.max_upload_bytes", self.server.max_upload_bytes),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
        }

        if self.auth.token_expiry <= 0 {
            return Err(ConfigError::ValidationError(
                "auth.token_expiry must be greater than zero".to_string(),
            ));
        }
        if self.embedding.timeout_secs == 0 || self.generation.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "provider timeout_secs must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(ConfigError::ValidationError(format!(
                "generation.temperature must be between 0 and 2 (got {})",
                self.generation.temperature
            )));
        }
        if self.embedding.model.trim().is_empty() || self.generation.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "embedding.model and generation.model are required".to_string(),
            ));
        }

        self.validate_env_var(&self.auth.jwt_secret_env)?;
        self.provider_api_key("embedding", self.embedding.provider, &self.embedding.api_key_env)?;
        self.provider_api_key(
            "generation",
            self.generation.provider,
            &self.generation.api_key_env,
        )?;

        if let Some(ref env) = self.database.turso_url_env {
            self.validate_env_var(env)?;
        }
        if let Some(ref env) = self.database.turso_token_env {
            self.validate_env_var(env)?;
        }

        Ok(())
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        self.resolve_env(name)
            .map(|_| ())
            .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
    }

    /// Get a resolved value from an env var reference
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok().filter(|v| !v.is_empty())
    }

    /// Get the JWT secret from the environment
    pub fn jwt_secret(&self) -> Result<String, ConfigError> {
        self.resolve_env(&self.auth.jwt_secret_env)
            .ok_or_else(|| ConfigError::MissingEnvVar(self.auth.jwt_secret_env.clone()))
    }

    fn provider_api_key(
        &self,
        section: &str,
        kind: ProviderKind,
        api_key_env: &Option<String>,
    ) -> Result<String, ConfigError> {
        match (kind, api_key_env) {
            (ProviderKind::Ollama, _) => Ok(String::new()),
            (ProviderKind::OpenAI, None) => Err(ConfigError::ValidationError(format!(
                "{}.api_key_env is required for the openai provider",
                section
            ))),
            (ProviderKind::OpenAI, Some(env)) => self
                .resolve_env(env)
                .ok_or_else(|| ConfigError::MissingEnvVar(env.clone())),
        }
    }

    /// Build the embedding provider selection
    pub fn embedding_provider(&self) -> Result<EmbeddingProvider, ConfigError> {
        let cfg = &self.embedding;
        let base_url = cfg
            .base_url
            .clone()
            .unwrap_or_else(|| cfg.provider.default_base_url().to_string());

        Ok(match cfg.provider {
            ProviderKind::Ollama => EmbeddingProvider::Ollama {
                base_url,
                model: cfg.model.clone(),
            },
            ProviderKind::OpenAI => EmbeddingProvider::OpenAI {
                api_key: self.provider_api_key("embedding", cfg.provider, &cfg.api_key_env)?,
                api_base: base_url,
                model: cfg.model.clone(),
                dimensions: cfg.dimensions,
            },
        })
    }

    /// Build the generation provider selection
    pub fn generation_provider(&self) -> Result<Provider, ConfigError> {
        let cfg = &self.generation;
        let base_url = cfg
            .base_url
            .clone()
            .unwrap_or_else(|| cfg.provider.default_base_url().to_string());

        Ok(match cfg.provider {
            ProviderKind::Ollama => Provider::Ollama {
                base_url,
                model: cfg.model.clone(),
                temperature: Some(cfg.temperature),
            },
            ProviderKind::OpenAI => Provider::OpenAI {
                api_key: self.provider_api_key("generation", cfg.provider, &cfg.api_key_env)?,
                api_base: base_url,
                model: cfg.model.clone(),
                temperature: Some(cfg.temperature),
            },
        })
    }

    /// Resolve which database backend to open
    pub fn database_provider(&self) -> Result<DatabaseProvider, ConfigError> {
        let url = match self.database.turso_url_env {
            Some(ref env) => self
                .resolve_env(env)
                .ok_or_else(|| ConfigError::MissingEnvVar(env.clone()))?,
            None => self.database.url.clone(),
        };
        let token = self
            .database
            .turso_token_env
            .as_ref()
            .and_then(|env| self.resolve_env(env));

        DatabaseProvider::from_url(&url, token)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}
