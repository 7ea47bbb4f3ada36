use crate::types::{AppError, Result};

/// Default window size, in whitespace-separated tokens.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Splits text into windows of a fixed number of whitespace-separated tokens.
///
/// Tokens inside a window are rejoined with single spaces, so the original
/// whitespace layout (newlines, tabs, runs of spaces) is not preserved. The
/// last window may be shorter than `chunk_size`.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    chunk_size: usize,
}

impl TextChunker {
    /// Create a chunker. `chunk_size` must be positive.
    pub fn new(chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(AppError::InvalidInput(
                "Chunk size must be a positive integer".to_string(),
            ));
        }
        Ok(Self { chunk_size })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();

        words
            .chunks(self.chunk_size)
            .map(|window| window.join(" "))
            .map(|chunk| chunk.trim().to_string())
            .filter(|chunk| !chunk.is_empty())
            .collect()
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}
