//! Directory-persisted vector index with cosine top-K search

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use genba_core::{Error, LlmProvider, Result};

use crate::chunker::TextChunker;
use crate::loader::{self, LoaderRegistry};
use crate::normalize;

const INDEX_FILE: &str = "index.json";

/// Provisioning state of a named index location.
///
/// The transition Absent → Building → Ready runs inside `get_or_build`;
/// directory existence is the sole Absent/Ready signal between processes.
/// Concurrent first-use from two processes can race the build; single-writer
/// election would be needed before multi-session use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Absent,
    Building,
    Ready,
}

/// A chunk with its embedding, owned by the index and never mutated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedChunk {
    pub id: String,
    pub content: String,
    pub metadata: HashMap<String, String>,
    pub source: PathBuf,
    pub embedding: Vec<f32>,
}

/// One search hit
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: EmbeddedChunk,
    pub score: f32,
}

#[derive(Serialize, Deserialize)]
struct PersistedIndex {
    /// Recorded at build time. Not re-verified on load: searching with a
    /// different embedding function silently degrades results.
    embedding_dimension: usize,
    chunks: Vec<EmbeddedChunk>,
}

/// In-memory searchable index over embedded chunks
pub struct SearchIndex {
    chunks: Vec<EmbeddedChunk>,
    embedding_dimension: usize,
}

impl SearchIndex {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn embedding_dimension(&self) -> usize {
        self.embedding_dimension
    }

    /// Up to `k` chunks nearest to the query vector, nearest first
    pub fn search(&self, query: &[f32], k: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<(f32, &EmbeddedChunk)> = self
            .chunks
            .iter()
            .map(|chunk| (cosine_similarity(query, &chunk.embedding), chunk))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .take(k)
            .map(|(score, chunk)| ScoredChunk {
                chunk: chunk.clone(),
                score,
            })
            .collect()
    }
}

/// Builds or loads named indexes over a configured source tree
pub struct IndexStore<P: LlmProvider> {
    provider: Arc<P>,
    source_root: PathBuf,
    registry: LoaderRegistry,
    chunker: TextChunker,
}

impl<P: LlmProvider> IndexStore<P> {
    pub fn new(provider: Arc<P>, source_root: impl Into<PathBuf>) -> Self {
        Self {
            provider,
            source_root: source_root.into(),
            registry: LoaderRegistry::default(),
            chunker: TextChunker::default(),
        }
    }

    pub fn with_chunker(mut self, chunker: TextChunker) -> Self {
        self.chunker = chunker;
        self
    }

    pub fn with_registry(mut self, registry: LoaderRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Observable provisioning state of a named location
    pub fn state(&self, dir: &Path) -> IndexState {
        if dir.is_dir() {
            IndexState::Ready
        } else {
            IndexState::Absent
        }
    }

    /// Load the index persisted at `dir`, or run the full
    /// ingest → normalize → chunk → embed pipeline and persist it there.
    ///
    /// Directory existence is the sole load-vs-build signal.
    pub async fn get_or_build(&self, dir: &Path) -> Result<SearchIndex> {
        if dir.is_dir() {
            debug!(path = %dir.display(), "loading persisted index");
            return load_index(dir);
        }

        info!(path = %dir.display(), state = ?IndexState::Building, "building index");
        let index = self.build().await?;
        persist_index(dir, &index)?;
        info!(
            path = %dir.display(),
            state = ?IndexState::Ready,
            chunks = index.len(),
            "index ready"
        );
        Ok(index)
    }

    async fn build(&self) -> Result<SearchIndex> {
        let mut documents = loader::load_tree(&self.source_root, &self.registry)?;

        for doc in &mut documents {
            doc.content = normalize::adjust_string(&doc.content).into_owned();
            for value in doc.metadata.values_mut() {
                *value = normalize::adjust_string(value).into_owned();
            }
        }

        let chunks = self.chunker.split_documents(&documents);
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.provider.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(Error::Retrieval(format!(
                "embedded {} of {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let embedding_dimension = embeddings.first().map(|e| e.len()).unwrap_or(0);
        let embedded = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| EmbeddedChunk {
                id: chunk.id,
                content: chunk.content,
                metadata: chunk.metadata,
                source: chunk.source,
                embedding,
            })
            .collect();

        Ok(SearchIndex {
            chunks: embedded,
            embedding_dimension,
        })
    }
}

fn load_index(dir: &Path) -> Result<SearchIndex> {
    let raw = fs::read_to_string(dir.join(INDEX_FILE))?;
    let persisted: PersistedIndex =
        serde_json::from_str(&raw).map_err(|e| Error::Serialization(e.to_string()))?;
    Ok(SearchIndex {
        chunks: persisted.chunks,
        embedding_dimension: persisted.embedding_dimension,
    })
}

fn persist_index(dir: &Path, index: &SearchIndex) -> Result<()> {
    fs::create_dir_all(dir)?;
    let persisted = PersistedIndex {
        embedding_dimension: index.embedding_dimension,
        chunks: index.chunks.clone(),
    };
    let content =
        serde_json::to_string(&persisted).map_err(|e| Error::Serialization(e.to_string()))?;
    fs::write(dir.join(INDEX_FILE), content)?;
    Ok(())
}

/// Cosine similarity between two vectors
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_similarity_basics() {
        let v1 = vec![1.0, 0.0, 0.0];
        let v2 = vec![1.0, 0.0, 0.0];
        let v3 = vec![0.0, 1.0, 0.0];

        assert!((cosine_similarity(&v1, &v2) - 1.0).abs() < 0.001);
        assert!((cosine_similarity(&v1, &v3) - 0.0).abs() < 0.001);
        assert_eq!(cosine_similarity(&v1, &[1.0]), 0.0);
    }

    #[test]
    fn search_orders_nearest_first_and_respects_k() {
        let chunk = |id: &str, embedding: Vec<f32>| EmbeddedChunk {
            id: id.to_string(),
            content: id.to_string(),
            metadata: HashMap::new(),
            source: PathBuf::from("x"),
            embedding,
        };
        let index = SearchIndex {
            chunks: vec![
                chunk("far", vec![0.0, 1.0]),
                chunk("near", vec![1.0, 0.0]),
                chunk("mid", vec![0.7, 0.7]),
            ],
            embedding_dimension: 2,
        };

        let hits = index.search(&[1.0, 0.0], 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.id, "near");
        assert_eq!(hits[1].chunk.id, "mid");
        assert!(hits[0].score >= hits[1].score);
    }
}
