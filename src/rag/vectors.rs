//! Serialized chunk/vector layout stored on a subject row.
//!
//! A subject's chunks are persisted as one JSON array of
//! `{"text": ..., "embedding": [...]}` records. The position in the array is
//! the chunk index, so the array order is the retrieval tie-break order and
//! must never be rearranged.

use crate::types::{AppError, Result};
use serde::{Deserialize, Serialize};

/// One persisted `(chunk text, embedding)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A chunk restored from storage, tagged with its sequence index.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
    pub embedding: Vec<f32>,
}

impl Chunk {
    pub fn dimensions(&self) -> usize {
        self.embedding.len()
    }
}

/// Serialize an index-ordered list of records.
///
/// Refuses to write an empty list, empty vectors or mixed dimensionality, so a
/// stored blob always satisfies the invariants [`decode`] checks.
pub fn encode(records: &[VectorRecord]) -> Result<String> {
    check_dimensions(records.iter().map(|r| r.embedding.len()))
        .map_err(|e| AppError::Internal(format!("Refusing to store vectors: {}", e)))?;

    serde_json::to_string(records)
        .map_err(|e| AppError::Internal(format!("Failed to serialize vectors: {}", e)))
}

/// Deserialize a stored blob back into indexed chunks.
pub fn decode(blob: &str) -> Result<Vec<Chunk>> {
    let records: Vec<VectorRecord> = serde_json::from_str(blob)
        .map_err(|e| AppError::CorruptVectorData(format!("Malformed vector blob: {}", e)))?;

    check_dimensions(records.iter().map(|r| r.embedding.len()))
        .map_err(AppError::CorruptVectorData)?;

    Ok(records
        .into_iter()
        .enumerate()
        .map(|(index, record)| Chunk {
            index,
            text: record.text,
            embedding: record.embedding,
        })
        .collect())
}

/// Shared dimensionality of a subject's vectors.
pub fn dimensions(chunks: &[Chunk]) -> Option<usize> {
    chunks.first().map(Chunk::dimensions)
}

fn check_dimensions(mut lens: impl Iterator<Item = usize>) -> std::result::Result<(), String> {
    let first = lens
        .next()
        .ok_or_else(|| "vector list is empty".to_string())?;
    if first == 0 {
        return Err("vector 0 has no components".to_string());
    }

    for (i, len) in lens.enumerate() {
        if len != first {
            return Err(format!(
                "vector {} has {} dimensions, expected {}",
                i + 1,
                len,
                first
            ));
        }
    }
    Ok(())
}
