//! Uploaded documents awaiting text extraction.
//!
//! The payload lives in a [`NamedTempFile`] for as long as the
//! [`UploadedDocument`] is alive. The file is unlinked on drop, so every exit
//! from ingestion releases it, including early returns and a cancelled request.

use crate::types::{AppError, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const TEXT_CONTENT_TYPE: &str = "text/plain";

/// Document formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
}

impl DocumentKind {
    /// Resolve the kind from a multipart content type, falling back to the
    /// file name extension when the client sent a generic type.
    pub fn detect(content_type: Option<&str>, file_name: Option<&str>) -> Result<Self> {
        let essence = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase());

        match essence.as_deref() {
            Some(PDF_CONTENT_TYPE) => return Ok(DocumentKind::Pdf),
            Some(TEXT_CONTENT_TYPE) => return Ok(DocumentKind::PlainText),
            Some("application/octet-stream") | None => {}
            Some(_) => return Err(unsupported()),
        }

        let extension = file_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("pdf") => Ok(DocumentKind::Pdf),
            Some("txt") => Ok(DocumentKind::PlainText),
            _ => Err(unsupported()),
        }
    }
}

fn unsupported() -> AppError {
    AppError::InvalidInput("Only PDF or plain text files are allowed".to_string())
}

/// A document written to a temporary file, released when dropped.
#[derive(Debug)]
pub struct UploadedDocument {
    file: NamedTempFile,
    kind: DocumentKind,
    size: usize,
}

impl UploadedDocument {
    /// Persist `bytes` to a fresh temporary file.
    pub fn from_bytes(bytes: &[u8], kind: DocumentKind) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("syllabus-upload-")
            .tempfile()
            .map_err(|e| AppError::Internal(format!("Failed to create temp file: {}", e)))?;

        file.write_all(bytes)
            .and_then(|_| file.flush())
            .map_err(|e| AppError::Internal(format!("Failed to write upload: {}", e)))?;

        Ok(Self {
            file,
            kind,
            size: bytes.len(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Extract the document's text. Parsing runs on the blocking pool.
    pub async fn extract_text(&self) -> Result<String> {
        let path = self.path().to_path_buf();
        let kind = self.kind;

        tokio::task::spawn_blocking(move || match kind {
            DocumentKind::Pdf => extract_pdf(&path),
            DocumentKind::PlainText => extract_plain(&path),
        })
        .await
        .map_err(|e| AppError::Internal(format!("Extraction task failed: {}", e)))?
    }
}

fn extract_pdf(path: &Path) -> Result<String> {
    // An unparseable PDF is reported the same way as one without text.
    let document = match lopdf::Document::load(path) {
        Ok(document) => document,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to parse PDF upload");
            return Err(AppError::EmptyDocument);
        }
    };

    let pages: Vec<u32> = document.get_pages().keys().copied().collect();
    if pages.is_empty() {
        return Err(AppError::EmptyDocument);
    }

    document.extract_text(&pages).map_err(|e| {
        tracing::warn!(error = %e, pages = pages.len(), "Failed to extract PDF text");
        AppError::EmptyDocument
    })
}

fn extract_plain(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .map_err(|e| AppError::Internal(format!("Failed to read upload: {}", e)))?;

    String::from_utf8(bytes)
        .map_err(|_| AppError::InvalidInput("Text uploads must be valid UTF-8".to_string()))
}
