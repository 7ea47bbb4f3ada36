//! Brute-force similarity search over a subject's stored chunks.
//!
//! Every query is compared against every stored vector (`O(N·D)`), which is
//! fine for per-subject chunk counts in the tens or hundreds.

use super::vectors::Chunk;
use serde::Serialize;

/// Cosine similarity between two vectors.
///
/// Total over all inputs: vectors of different length, a zero-norm vector,
/// or a non-finite intermediate all score `0.0`. Callers that need to treat a
/// dimensionality mismatch as an error must check before calling (the query
/// pipeline does).
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return 0.0;
    }

    let similarity = dot / denom;
    if similarity.is_finite() {
        similarity
    } else {
        0.0
    }
}

/// A retrieved chunk with its score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub index: usize,
    pub similarity: f32,
    pub text: String,
}

/// Select the `k` chunks most similar to `query`.
///
/// Results are ordered by descending similarity; equal scores keep ascending
/// chunk index order. Fewer than `k` chunks returns all of them.
pub fn top_k(chunks: &[Chunk], query: &[f32], k: usize) -> Vec<ScoredChunk> {
    let mut scored: Vec<ScoredChunk> = chunks
        .iter()
        .map(|chunk| ScoredChunk {
            index: chunk.index,
            similarity: cosine_similarity(&chunk.embedding, query),
            text: chunk.text.clone(),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then_with(|| a.index.cmp(&b.index))
    });
    scored.truncate(k);
    scored
}
