//! LLM Provider Clients and Abstractions
//!
//! The generation capability used to answer student questions. The rest of
//! the application only talks to [`LLMClient`]; [`Provider`] builds a concrete
//! client from the `[generation]` section of `syllabus.toml`.
//!
//! # Supported Providers
//!
//! Enable providers via Cargo features:
//! - `openai` - OpenAI API and compatible servers
//! - `ollama` - Local Ollama server

/// Core LLM client trait and provider selection.
pub mod client;

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "openai")]
pub mod openai;

pub use client::{LLMClient, Provider};

#[cfg(test)]
pub use client::MockLLMClient;
