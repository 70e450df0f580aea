//! In-memory vector index with brute-force cosine search.
//!
//! Corpus sizes here are hundreds of documents, so a linear scan beats
//! any ANN structure on both latency and complexity.

use agroclaw_core::types::{Document, ScoredDocument};
use agroclaw_core::{AgroClawError, Result};

/// Guards the cosine denominator against zero-norm document vectors.
const NORM_EPSILON: f32 = 1e-10;

/// Cosine similarity between two vectors. Mismatched lengths score over
/// the shorter prefix; zero norms are clamped rather than dividing by 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    dot / (norm_a * norm_b).max(NORM_EPSILON)
}

/// Immutable document/embedding matrix. Built once, swapped in whole;
/// readers never observe a partially built index.
#[derive(Debug)]
pub struct VectorIndex {
    documents: Vec<Document>,
    embeddings: Vec<Vec<f32>>,
}

impl VectorIndex {
    pub fn empty() -> Self {
        Self {
            documents: vec![],
            embeddings: vec![],
        }
    }

    /// Pair up documents with their embeddings. A count mismatch means
    /// the build went wrong and the index must not be used.
    pub fn new(documents: Vec<Document>, embeddings: Vec<Vec<f32>>) -> Result<Self> {
        if documents.len() != embeddings.len() {
            return Err(AgroClawError::IndexCorruption {
                documents: documents.len(),
                embeddings: embeddings.len(),
            });
        }
        Ok(Self {
            documents,
            embeddings,
        })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    /// Top-`top_k` documents scoring at least `threshold` against the
    /// query vector, best first. A zero-norm query matches nothing.
    pub fn search(&self, query: &[f32], top_k: usize, threshold: f32) -> Vec<ScoredDocument> {
        if self.is_empty() {
            return vec![];
        }
        let query_norm: f32 = query.iter().map(|x| x * x).sum::<f32>().sqrt();
        if query_norm == 0.0 {
            return vec![];
        }

        let mut scored: Vec<(usize, f32)> = self
            .embeddings
            .iter()
            .enumerate()
            .map(|(i, emb)| (i, cosine_similarity(query, emb)))
            .filter(|(_, score)| *score >= threshold)
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        scored
            .into_iter()
            .map(|(i, score)| ScoredDocument {
                document: self.documents[i].clone(),
                score,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agroclaw_core::types::DocKind;

    fn doc(id: &str) -> Document {
        Document {
            id: id.into(),
            kind: DocKind::Tip,
            text: format!("text for {id}"),
            metadata: serde_json::json!({}),
        }
    }

    #[test]
    fn test_cosine_identical_is_one() {
        let v = vec![0.3, 0.5, 0.2];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_cosine_orthogonal_is_zero() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_vector_does_not_nan() {
        let s = cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]);
        assert!(!s.is_nan());
        assert_eq!(s, 0.0);
    }

    #[test]
    fn test_count_mismatch_is_corruption() {
        let err = VectorIndex::new(vec![doc("a")], vec![]).unwrap_err();
        assert!(matches!(
            err,
            AgroClawError::IndexCorruption {
                documents: 1,
                embeddings: 0
            }
        ));
    }

    #[test]
    fn test_search_ranks_and_thresholds() {
        let index = VectorIndex::new(
            vec![doc("a"), doc("b"), doc("c")],
            vec![
                vec![1.0, 0.0],  // score 1.0
                vec![1.0, 1.0],  // score ~0.707
                vec![0.0, 1.0],  // score 0.0 — below threshold
            ],
        )
        .unwrap();

        let hits = index.search(&[1.0, 0.0], 3, 0.35);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document.id, "a");
        assert_eq!(hits[1].document.id, "b");
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let index = VectorIndex::new(vec![doc("a")], vec![vec![1.0, 0.0]]).unwrap();
        // Exact-threshold scores survive.
        let hits = index.search(&[1.0, 0.0], 1, 1.0);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_top_k_truncates() {
        let index = VectorIndex::new(
            vec![doc("a"), doc("b"), doc("c")],
            vec![vec![1.0, 0.0], vec![0.9, 0.1], vec![0.8, 0.2]],
        )
        .unwrap();
        let hits = index.search(&[1.0, 0.0], 2, 0.35);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_zero_norm_query_matches_nothing() {
        let index = VectorIndex::new(vec![doc("a")], vec![vec![1.0, 0.0]]).unwrap();
        assert!(index.search(&[0.0, 0.0], 3, 0.0).is_empty());
    }

    #[test]
    fn test_empty_index_matches_nothing() {
        assert!(VectorIndex::empty().search(&[1.0], 3, 0.0).is_empty());
    }
}
