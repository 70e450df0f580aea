//! Corpus assembly: database records flattened into retrievable text.

use agroclaw_core::traits::{RecordStore, TextModel};
use agroclaw_core::types::{DocKind, Document, EmbeddingTask};

/// Flatten news and tips into documents. A failing source is logged and
/// skipped so one broken table cannot empty the whole corpus.
pub fn build_corpus(store: &dyn RecordStore) -> Vec<Document> {
    let mut docs = Vec::new();

    match store.all_news(None, None) {
        Ok(news) => {
            for item in news {
                let text = format!(
                    "News Title: {}\nSummary: {}\nContent: {}",
                    item.title, item.summary, item.content
                );
                let metadata = serde_json::to_value(&item).unwrap_or_default();
                docs.push(Document {
                    id: format!("{}{}", DocKind::News.id_prefix(), item.id),
                    kind: DocKind::News,
                    text,
                    metadata,
                });
            }
        }
        Err(e) => tracing::error!("⚠️ Error fetching news for corpus: {e}"),
    }

    match store.all_tips(None, None) {
        Ok(tips) => {
            for item in tips {
                let text = format!(
                    "Tip Title: {}\nDifficulty: {}\nContent: {}",
                    item.title,
                    item.difficulty.as_deref().unwrap_or("General"),
                    item.content
                );
                let metadata = serde_json::to_value(&item).unwrap_or_default();
                docs.push(Document {
                    id: format!("{}{}", DocKind::Tip.id_prefix(), item.id),
                    kind: DocKind::Tip,
                    text,
                    metadata,
                });
            }
        }
        Err(e) => tracing::error!("⚠️ Error fetching tips for corpus: {e}"),
    }

    docs
}

/// Embed the corpus in batches, one vector per document, in order.
///
/// A failed batch falls back to embedding its members one by one; a
/// member that still fails gets an all-zero vector. Lossy, but the
/// index stays available and aligned.
pub async fn embed_corpus(
    provider: &dyn TextModel,
    embedding_model: &str,
    docs: &[Document],
    batch_size: usize,
    embedding_dims: usize,
) -> Vec<Vec<f32>> {
    let batch_size = batch_size.max(1);
    let mut embeddings = Vec::with_capacity(docs.len());
    let texts: Vec<String> = docs.iter().map(|d| d.text.clone()).collect();

    for (i, chunk) in texts.chunks(batch_size).enumerate() {
        tracing::debug!("📦 Embedding batch {} ({} texts)", i + 1, chunk.len());
        match provider
            .embed(embedding_model, chunk, EmbeddingTask::Document)
            .await
        {
            Ok(batch) => embeddings.extend(batch),
            Err(e) => {
                tracing::error!("⚠️ Batch embedding failed: {e}. Falling back to single.");
                for text in chunk {
                    match provider
                        .embed(
                            embedding_model,
                            std::slice::from_ref(text),
                            EmbeddingTask::Document,
                        )
                        .await
                    {
                        Ok(mut single) => embeddings.extend(single.drain(..)),
                        Err(e) => {
                            tracing::error!("⚠️ Embedding failed, substituting zero vector: {e}");
                            embeddings.push(vec![0.0; embedding_dims]);
                        }
                    }
                }
            }
        }
    }

    embeddings
}
