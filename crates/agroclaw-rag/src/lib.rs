//! # AgroClaw RAG
//!
//! Retrieval layer: the database corpus embedded into an in-memory
//! vector index, persisted as a binary snapshot so restarts skip the
//! (quota-expensive) re-embedding pass. The index is published behind an
//! `RwLock<Arc<_>>`; a rebuild swaps the whole index in one store.

pub mod corpus;
pub mod index;
pub mod snapshot;

use std::sync::{Arc, RwLock};

use agroclaw_core::config::RagConfig;
use agroclaw_core::traits::{RecordStore, TextModel};
use agroclaw_core::types::{EmbeddingTask, ScoredDocument};
use agroclaw_core::{AgroClawError, Result};

pub use index::{cosine_similarity, VectorIndex};

pub struct Retriever {
    config: RagConfig,
    embedding_model: String,
    provider: Arc<dyn TextModel>,
    store: Arc<dyn RecordStore>,
    index: RwLock<Arc<VectorIndex>>,
}

impl Retriever {
    pub fn new(
        config: RagConfig,
        embedding_model: impl Into<String>,
        provider: Arc<dyn TextModel>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            config,
            embedding_model: embedding_model.into(),
            provider,
            store,
            index: RwLock::new(Arc::new(VectorIndex::empty())),
        }
    }

    /// Documents currently served by the index.
    pub fn doc_count(&self) -> usize {
        self.current().len()
    }

    fn current(&self) -> Arc<VectorIndex> {
        match self.index.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn publish(&self, index: VectorIndex) {
        let arc = Arc::new(index);
        match self.index.write() {
            Ok(mut guard) => *guard = arc,
            Err(poisoned) => *poisoned.into_inner() = arc,
        }
    }

    /// Bring the index up: snapshot first unless `force_refresh`, full
    /// rebuild otherwise. Returns the served document count.
    ///
    /// A rebuild that comes out corrupt gets exactly one more attempt;
    /// if that also fails the index goes up empty rather than serving
    /// garbage scores.
    pub async fn load(&self, force_refresh: bool) -> Result<usize> {
        let path = self.config.resolved_snapshot_path();

        if !force_refresh && path.exists() {
            match snapshot::load(&path) {
                Ok(index) => {
                    tracing::info!("📚 Loaded {} documents from snapshot", index.len());
                    self.publish(index);
                    return Ok(self.doc_count());
                }
                Err(e) => {
                    tracing::warn!("⚠️ Snapshot unusable ({e}), rebuilding from database");
                }
            }
        }

        let index = match self.rebuild().await {
            Ok(index) => index,
            Err(AgroClawError::IndexCorruption { .. }) => {
                tracing::warn!("⚠️ Index build came out corrupt, retrying once");
                match self.rebuild().await {
                    Ok(index) => index,
                    Err(e) => {
                        tracing::error!("❌ Rebuild failed again ({e}), serving empty index");
                        VectorIndex::empty()
                    }
                }
            }
            Err(e) => return Err(e),
        };

        if let Err(e) = snapshot::save(&path, &index) {
            tracing::error!("⚠️ Could not save snapshot: {e}");
        }

        tracing::info!("📚 RAG index ready: {} documents", index.len());
        self.publish(index);
        Ok(self.doc_count())
    }

    async fn rebuild(&self) -> Result<VectorIndex> {
        let docs = corpus::build_corpus(self.store.as_ref());
        if docs.is_empty() {
            tracing::warn!("⚠️ No documents found in database");
            return Ok(VectorIndex::empty());
        }
        tracing::info!("🔧 Embedding {} documents...", docs.len());
        let embeddings = corpus::embed_corpus(
            self.provider.as_ref(),
            &self.embedding_model,
            &docs,
            self.config.batch_size,
            self.config.embedding_dims,
        )
        .await;
        VectorIndex::new(docs, embeddings)
    }

    /// Embed the query and return documents above the relevance
    /// threshold, best first. An empty index answers without touching
    /// the provider; any failure degrades to no results — retrieval is
    /// an enhancement, never a hard dependency.
    pub async fn search(&self, query: &str) -> Vec<ScoredDocument> {
        let index = self.current();
        if index.is_empty() {
            return vec![];
        }

        let query_owned = query.to_string();
        let vectors = match self
            .provider
            .embed(
                &self.embedding_model,
                std::slice::from_ref(&query_owned),
                EmbeddingTask::Query,
            )
            .await
        {
            Ok(vectors) => vectors,
            Err(e) => {
                tracing::warn!("⚠️ Query embedding failed ({e}), skipping retrieval");
                return vec![];
            }
        };
        let Some(query_vec) = vectors.first() else {
            tracing::warn!("⚠️ Empty query embedding, skipping retrieval");
            return vec![];
        };

        index.search(query_vec, self.config.top_k, self.config.score_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agroclaw_core::types::{CategoryRecord, NewsRecord, SystemInstruction, TipRecord};
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic embedder: direction picked by keyword.
    struct FakeModel {
        embed_calls: AtomicUsize,
    }

    impl FakeModel {
        fn new() -> Self {
            Self {
                embed_calls: AtomicUsize::new(0),
            }
        }

        fn vector_for(text: &str) -> Vec<f32> {
            if text.contains("sulama") || text.contains("Sulama") {
                vec![1.0, 0.0, 0.0]
            } else if text.contains("Kuraklık") || text.contains("kuraklık") {
                vec![0.0, 1.0, 0.0]
            } else {
                vec![0.0, 0.0, 1.0]
            }
        }
    }

    #[async_trait]
    impl TextModel for FakeModel {
        async fn embed(
            &self,
            _model: &str,
            texts: &[String],
            _task: EmbeddingTask,
        ) -> Result<Vec<Vec<f32>>> {
            self.embed_calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|t| Self::vector_for(t)).collect())
        }

        async fn generate(
            &self,
            _model: &str,
            _prompt: &str,
            _instruction: Option<&SystemInstruction>,
        ) -> Result<serde_json::Value> {
            Ok(serde_json::json!({}))
        }

        fn is_configured(&self) -> bool {
            true
        }
    }

    /// Embedder that always answers with a single vector, whatever the
    /// batch size. Guarantees a count mismatch on multi-doc corpora.
    struct MiscountModel;

    #[async_trait]
    impl TextModel for MiscountModel {
        async fn embed(
            &self,
            _model: &str,
            _texts: &[String],
            _task: EmbeddingTask,
        ) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0, 0.0]])
        }

        async fn generate(
            &self,
            _model: &str,
            _prompt: &str,
            _instruction: Option<&SystemInstruction>,
        ) -> Result<serde_json::Value> {
            Ok(serde_json::json!({}))
        }

        fn is_configured(&self) -> bool {
            true
        }
    }

    /// Embedder whose every call fails.
    struct BrokenModel;

    #[async_trait]
    impl TextModel for BrokenModel {
        async fn embed(
            &self,
            _model: &str,
            _texts: &[String],
            _task: EmbeddingTask,
        ) -> Result<Vec<Vec<f32>>> {
            Err(AgroClawError::QuotaExhausted("429".into()))
        }

        async fn generate(
            &self,
            _model: &str,
            _prompt: &str,
            _instruction: Option<&SystemInstruction>,
        ) -> Result<serde_json::Value> {
            Err(AgroClawError::QuotaExhausted("429".into()))
        }

        fn is_configured(&self) -> bool {
            true
        }
    }

    struct FakeStore;

    impl RecordStore for FakeStore {
        fn all_news(
            &self,
            _limit: Option<usize>,
            _category_id: Option<i64>,
        ) -> Result<Vec<NewsRecord>> {
            Ok(vec![NewsRecord {
                id: 1,
                title: "Kuraklık uyarısı".into(),
                summary: "kurak yaz".into(),
                content: "detay".into(),
                category_id: 1,
                image_url: None,
                published_at: None,
                created_at: "2026-08-01".into(),
            }])
        }
        fn get_news(&self, _id: i64) -> Result<Option<NewsRecord>> {
            Ok(None)
        }
        fn add_news(
            &self,
            _t: &str,
            _s: &str,
            _c: &str,
            _cat: i64,
            _i: Option<&str>,
            _p: Option<&str>,
        ) -> Result<i64> {
            Ok(0)
        }
        fn update_news(
            &self,
            _id: i64,
            _t: Option<&str>,
            _s: Option<&str>,
            _c: Option<&str>,
            _cat: Option<i64>,
            _i: Option<&str>,
            _p: Option<&str>,
        ) -> Result<bool> {
            Ok(false)
        }
        fn delete_news(&self, _id: i64) -> Result<bool> {
            Ok(false)
        }
        fn all_tips(&self, _limit: Option<usize>, _d: Option<&str>) -> Result<Vec<TipRecord>> {
            Ok(vec![TipRecord {
                id: 2,
                title: "Sulama ipucu".into(),
                content: "sabah sulama yapın".into(),
                difficulty: Some("Kolay".into()),
                created_at: "2026-08-01".into(),
            }])
        }
        fn get_tip(&self, _id: i64) -> Result<Option<TipRecord>> {
            Ok(None)
        }
        fn add_tip(&self, _t: &str, _c: &str, _d: Option<&str>) -> Result<i64> {
            Ok(0)
        }
        fn update_tip(
            &self,
            _id: i64,
            _t: Option<&str>,
            _c: Option<&str>,
            _d: Option<&str>,
        ) -> Result<bool> {
            Ok(false)
        }
        fn delete_tip(&self, _id: i64) -> Result<bool> {
            Ok(false)
        }
        fn all_categories(&self) -> Result<Vec<CategoryRecord>> {
            Ok(vec![])
        }
        fn get_category(&self, _id: i64) -> Result<Option<CategoryRecord>> {
            Ok(None)
        }
        fn add_category(&self, _n: &str, _d: Option<&str>) -> Result<i64> {
            Ok(0)
        }
    }

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("agroclaw-rag-{}-{}", std::process::id(), name))
    }

    fn retriever(snapshot: &PathBuf) -> Retriever {
        let config = RagConfig {
            snapshot_path: snapshot.to_string_lossy().into_owned(),
            ..RagConfig::default()
        };
        Retriever::new(
            config,
            "models/text-embedding-004",
            Arc::new(FakeModel::new()),
            Arc::new(FakeStore),
        )
    }

    #[tokio::test]
    async fn test_load_builds_and_snapshots() {
        let path = scratch("build.bin");
        let _ = std::fs::remove_file(&path);

        let r = retriever(&path);
        let count = r.load(false).await.unwrap();
        assert_eq!(count, 2);
        assert!(path.exists());

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_second_load_uses_snapshot() {
        let path = scratch("reuse.bin");
        let _ = std::fs::remove_file(&path);

        retriever(&path).load(false).await.unwrap();

        let model = Arc::new(FakeModel::new());
        let r = Retriever::new(
            RagConfig {
                snapshot_path: path.to_string_lossy().into_owned(),
                ..RagConfig::default()
            },
            "models/text-embedding-004",
            model.clone(),
            Arc::new(FakeStore),
        );
        let count = r.load(false).await.unwrap();
        assert_eq!(count, 2);
        // No embedding call happened: the snapshot carried the matrix.
        assert_eq!(model.embed_calls.load(Ordering::SeqCst), 0);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_force_refresh_re_embeds() {
        let path = scratch("force.bin");
        let _ = std::fs::remove_file(&path);

        retriever(&path).load(false).await.unwrap();

        let model = Arc::new(FakeModel::new());
        let r = Retriever::new(
            RagConfig {
                snapshot_path: path.to_string_lossy().into_owned(),
                ..RagConfig::default()
            },
            "models/text-embedding-004",
            model.clone(),
            Arc::new(FakeStore),
        );
        r.load(true).await.unwrap();
        assert!(model.embed_calls.load(Ordering::SeqCst) > 0);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_search_ranks_by_topic() {
        let path = scratch("search.bin");
        let _ = std::fs::remove_file(&path);

        let r = retriever(&path);
        r.load(false).await.unwrap();

        let hits = r.search("sabah sulama saati").await;
        assert!(!hits.is_empty());
        assert_eq!(hits[0].document.id, "tip_2");
        assert!(hits[0].score > 0.9);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_search_on_empty_index() {
        let path = scratch("never-built.bin");
        let r = retriever(&path);
        // Never loaded: empty index, no provider call.
        let hits = r.search("sulama").await;
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_build_degrades_to_empty_index() {
        let path = scratch("corrupt.bin");
        let _ = std::fs::remove_file(&path);

        let r = Retriever::new(
            RagConfig {
                snapshot_path: path.to_string_lossy().into_owned(),
                ..RagConfig::default()
            },
            "models/text-embedding-004",
            Arc::new(MiscountModel),
            Arc::new(FakeStore),
        );
        // Both the build and its retry come out misaligned; the index
        // must go up empty instead of serving garbage scores.
        let count = r.load(false).await.unwrap();
        assert_eq!(count, 0);
        assert!(r.search("sulama").await.is_empty());

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_failed_query_embedding_degrades_to_empty() {
        let path = scratch("degraded.bin");
        let _ = std::fs::remove_file(&path);

        // Build the index with the working model, then search with one
        // that is out of quota.
        retriever(&path).load(false).await.unwrap();

        let r = Retriever::new(
            RagConfig {
                snapshot_path: path.to_string_lossy().into_owned(),
                ..RagConfig::default()
            },
            "models/text-embedding-004",
            Arc::new(BrokenModel),
            Arc::new(FakeStore),
        );
        r.load(false).await.unwrap();

        let hits = r.search("sulama").await;
        assert!(hits.is_empty());

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_unrelated_query_below_threshold() {
        let path = scratch("unrelated.bin");
        let _ = std::fs::remove_file(&path);

        let r = retriever(&path);
        r.load(false).await.unwrap();

        // Embeds to the third axis: orthogonal to the whole corpus.
        let hits = r.search("borsa endeksi").await;
        assert!(hits.is_empty());

        let _ = std::fs::remove_file(&path);
    }
}
