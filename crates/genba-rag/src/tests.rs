//! Pipeline and index tests driven by a deterministic in-process provider

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tempfile::TempDir;

use genba_core::locale::{messages, Locale};
use genba_core::{ChatMessage, GenerationConfig, GenerationResult, LlmProvider, Result};

use crate::index::{IndexState, IndexStore};
use crate::pipeline::AnswerChain;

const EMBEDDING_DIMENSION: usize = 384;

/// Deterministic hash-feature embedding: word and bigram hashes projected
/// into a fixed-dimension normalized vector. Real enough for cosine ranking
/// without any network.
fn hash_embedding(text: &str) -> Vec<f32> {
    let normalized = text.to_lowercase();
    let words: Vec<&str> = normalized.split_whitespace().collect();

    let mut embedding = vec![0.0f32; EMBEDDING_DIMENSION];

    for (pos, word) in words.iter().enumerate() {
        let mut hasher = DefaultHasher::new();
        word.hash(&mut hasher);
        let hash = hasher.finish();

        let idx1 = (hash % EMBEDDING_DIMENSION as u64) as usize;
        let idx2 = ((hash >> 16) % EMBEDDING_DIMENSION as u64) as usize;
        let idx3 = ((hash >> 32) % EMBEDDING_DIMENSION as u64) as usize;

        let position_weight = 1.0 / (pos as f32 + 1.0);
        embedding[idx1] += position_weight;
        embedding[idx2] += position_weight * 0.7;
        embedding[idx3] += position_weight * 0.5;
    }

    for pair in words.windows(2) {
        let bigram = format!("{} {}", pair[0], pair[1]);
        let mut hasher = DefaultHasher::new();
        bigram.hash(&mut hasher);
        let idx = (hasher.finish() % EMBEDDING_DIMENSION as u64) as usize;
        embedding[idx] += 0.8;
    }

    let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for value in embedding.iter_mut() {
            *value /= magnitude;
        }
    }

    embedding
}

/// Provider returning a canned reply; embeddings are hash features
struct MockProvider {
    reply: String,
    chat_calls: AtomicUsize,
}

impl MockProvider {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            chat_calls: AtomicUsize::new(0),
        })
    }

    fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn chat(
        &self,
        _messages: &[ChatMessage],
        _config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        Ok(GenerationResult {
            text: self.reply.clone(),
            model_id: "mock".to_string(),
            tokens_used: None,
        })
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(hash_embedding(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| hash_embedding(t)).collect())
    }

    fn model_id(&self) -> &str {
        "mock"
    }
}

/// Source tree with one notices folder holding the schedule sentence
fn write_source_tree(extra_docs: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    let folder = tmp.path().join("notices");
    fs::create_dir(&folder).unwrap();
    fs::write(folder.join("schedule.txt"), "Work ends on the 30th.").unwrap();
    for (name, content) in extra_docs {
        fs::write(folder.join(name), content).unwrap();
    }
    tmp
}

async fn build_index(
    provider: Arc<MockProvider>,
    source: &Path,
    index_dir: &Path,
) -> crate::index::SearchIndex {
    IndexStore::new(provider, source)
        .get_or_build(index_dir)
        .await
        .unwrap()
}

#[tokio::test]
async fn get_or_build_transitions_from_absent_to_ready() {
    let source = write_source_tree(&[]);
    let tmp = TempDir::new().unwrap();
    let index_dir = tmp.path().join(".db_all");

    let provider = MockProvider::new("unused");
    let store = IndexStore::new(provider, source.path());

    assert_eq!(store.state(&index_dir), IndexState::Absent);
    let index = store.get_or_build(&index_dir).await.unwrap();
    assert_eq!(store.state(&index_dir), IndexState::Ready);
    assert_eq!(index.len(), 1);
    assert!(index_dir.join("index.json").is_file());
}

#[tokio::test]
async fn load_path_reproduces_build_path_results() {
    let source = write_source_tree(&[
        ("access.txt", "The site entrance moves to the north gate."),
        ("noise.txt", "Heavy machinery operates between nine and five."),
    ]);
    let tmp = TempDir::new().unwrap();
    let index_dir = tmp.path().join(".db_all");

    let provider = MockProvider::new("unused");
    let store = IndexStore::new(provider.clone(), source.path());

    let built = store.get_or_build(&index_dir).await.unwrap();
    let loaded = store.get_or_build(&index_dir).await.unwrap();

    assert_eq!(built.len(), loaded.len());
    assert_eq!(built.embedding_dimension(), loaded.embedding_dimension());

    let query = hash_embedding("when does the work end");
    let built_ids: Vec<String> = built.search(&query, 3).iter().map(|h| h.chunk.id.clone()).collect();
    let loaded_ids: Vec<String> = loaded.search(&query, 3).iter().map(|h| h.chunk.id.clone()).collect();
    assert_eq!(built_ids, loaded_ids);
}

#[tokio::test]
async fn retrieval_prefers_chunks_sharing_query_terms() {
    let source = write_source_tree(&[(
        "paving.txt",
        "Parking lot paving happens in the spring.",
    )]);
    let tmp = TempDir::new().unwrap();
    let index_dir = tmp.path().join(".db_all");

    let provider = MockProvider::new("unused");
    let index = build_index(provider, source.path(), &index_dir).await;

    let hits = index.search(&hash_embedding("work ends on the 30th"), 2);
    assert_eq!(hits.len(), 2);
    assert!(hits[0].chunk.content.contains("Work ends on the 30th."));
    assert!(hits[0].score > hits[1].score);
}

#[tokio::test]
async fn grounded_answer_references_the_retrieved_date() {
    let source = write_source_tree(&[]);
    let tmp = TempDir::new().unwrap();
    let index_dir = tmp.path().join(".db_all");

    let provider = MockProvider::new("According to the plan, the work ends on the 30th.");
    let index = build_index(provider.clone(), source.path(), &index_dir).await;

    let chain = AnswerChain::new(provider, index, Locale::En);
    let answer = chain.answer("When does construction end?", &[]).await.unwrap();
    assert!(answer.contains("30"));
}

#[tokio::test]
async fn low_relevance_reply_becomes_the_canonical_no_match_message() {
    let source = write_source_tree(&[]);
    let tmp = TempDir::new().unwrap();
    let index_dir = tmp.path().join(".db_all");

    let provider = MockProvider::new(
        "The information necessary for an answer was not found. Please change your construction-related question and send it again.",
    );
    let index = build_index(provider.clone(), source.path(), &index_dir).await;

    let chain = AnswerChain::new(provider, index, Locale::En);
    let answer = chain.answer("What color is the mayor's car?", &[]).await.unwrap();
    assert_eq!(answer, messages::no_doc_match(Locale::En));
}

#[tokio::test]
async fn rewrite_is_skipped_when_history_is_empty() {
    let source = write_source_tree(&[]);
    let tmp = TempDir::new().unwrap();
    let index_dir = tmp.path().join(".db_all");

    let provider = MockProvider::new("The work ends on the 30th.");
    let index = build_index(provider.clone(), source.path(), &index_dir).await;

    let chain = AnswerChain::new(provider.clone(), index, Locale::En);
    chain.answer("When does construction end?", &[]).await.unwrap();

    // Only the answer generation hit the model.
    assert_eq!(provider.chat_calls(), 1);
}

#[tokio::test]
async fn rewrite_runs_once_when_history_is_present() {
    let source = write_source_tree(&[]);
    let tmp = TempDir::new().unwrap();
    let index_dir = tmp.path().join(".db_all");

    let provider = MockProvider::new("The work ends on the 30th.");
    let index = build_index(provider.clone(), source.path(), &index_dir).await;

    let history = vec![
        ChatMessage::user("Tell me about the construction."),
        ChatMessage::assistant("It is a road repair project."),
    ];
    let chain = AnswerChain::new(provider.clone(), index, Locale::En);
    chain.answer("When does it end?", &history).await.unwrap();

    // One rewrite call plus one answer call.
    assert_eq!(provider.chat_calls(), 2);
}
