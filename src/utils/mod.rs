//! Configuration utilities
//!
//! - [`toml_config`] - `syllabus.toml` loading and validation

/// TOML configuration (`syllabus.toml`).
pub mod toml_config;
