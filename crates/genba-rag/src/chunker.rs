//! Deterministic newline-preferential text chunking

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::loader::Document;

/// A fixed-size overlapping slice of a document, the unit of indexing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub content: String,
    pub metadata: HashMap<String, String>,
    pub source: PathBuf,
}

/// Splits document content into overlapping windows, preferring newline
/// boundaries. The same content with the same parameters always yields the
/// same chunk sequence.
#[derive(Debug, Clone)]
pub struct TextChunker {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
        }
    }
}

impl TextChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    pub fn split_documents(&self, docs: &[Document]) -> Vec<Chunk> {
        docs.iter().flat_map(|doc| self.split_document(doc)).collect()
    }

    /// Split one document; every chunk carries a copy of the parent metadata.
    pub fn split_document(&self, doc: &Document) -> Vec<Chunk> {
        let source_hash = format!("{:x}", md5::compute(doc.source.to_string_lossy().as_bytes()));
        self.split_text(&doc.content)
            .into_iter()
            .enumerate()
            .map(|(ordinal, content)| Chunk {
                id: format!("{}-{:x}-{}", source_hash, md5::compute(content.as_bytes()), ordinal),
                content,
                metadata: doc.metadata.clone(),
                source: doc.source.clone(),
            })
            .collect()
    }

    /// Split text into windows of at most `chunk_size` characters.
    ///
    /// Lines are merged greedily; when a line would overflow the window, the
    /// window is flushed and its last `chunk_overlap` characters carry over.
    /// A single line longer than the window is hard-split by characters with
    /// the same overlap step.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let size = self.chunk_size.max(1);
        let overlap = self.chunk_overlap.min(size.saturating_sub(1));
        let step = size - overlap;

        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_chars = 0usize;

        for line in text.split('\n') {
            let line_chars = line.chars().count();

            if line_chars > size {
                if !current.is_empty() {
                    chunks.push(std::mem::take(&mut current));
                    current_chars = 0;
                }
                let chars: Vec<char> = line.chars().collect();
                let mut start = 0;
                loop {
                    let end = (start + size).min(chars.len());
                    let window: String = chars[start..end].iter().collect();
                    if end == chars.len() {
                        current = window;
                        current_chars = end - start;
                        break;
                    }
                    chunks.push(window);
                    start += step;
                }
                continue;
            }

            if !current.is_empty() && current_chars + 1 + line_chars > size {
                let carry = tail_chars(&current, overlap);
                chunks.push(std::mem::take(&mut current));
                current_chars = carry.chars().count();
                current = carry;
            }

            if !current.is_empty() {
                current.push('\n');
                current_chars += 1;
            }
            current.push_str(line);
            current_chars += line_chars;
        }

        if !current.trim().is_empty() {
            chunks.push(current);
        }

        chunks
    }
}

fn tail_chars(s: &str, n: usize) -> String {
    if n == 0 {
        return String::new();
    }
    let chars: Vec<char> = s.chars().collect();
    let start = chars.len().saturating_sub(n);
    chars[start..].iter().collect()
}
