use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::embeddings::cosine_similarity;
use crate::models::Passage;

/// One indexed passage with its embedding. Insertion order is the
/// tie-breaker for equal similarity scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedPassage {
    pub passage: Passage,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct ScoredPassage {
    pub passage: Passage,
    pub score: f32,
}

/// An immutable, fully-built state of the vector index. Replaced wholesale
/// on rebuild; never patched. The fingerprint ties a persisted snapshot to
/// the manifest it was built from, and model/dimensions tie it to the
/// embedding provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub entries: Vec<IndexedPassage>,
    pub fingerprint: String,
    pub model: String,
    pub dimensions: usize,
    pub built_at: DateTime<Utc>,
}

impl IndexSnapshot {
    pub fn new(
        entries: Vec<IndexedPassage>,
        fingerprint: String,
        model: String,
        dimensions: usize,
    ) -> Self {
        Self {
            entries,
            fingerprint,
            model,
            dimensions,
            built_at: Utc::now(),
        }
    }

    /// Top-k passages by cosine similarity, ordered descending. The sort is
    /// stable, so earlier-inserted passages win ties.
    pub fn top_k(&self, query: &[f32], k: usize) -> Vec<ScoredPassage> {
        let mut scored: Vec<(f32, &IndexedPassage)> = self
            .entries
            .iter()
            .map(|entry| (cosine_similarity(query, &entry.embedding), entry))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .take(k)
            .map(|(score, entry)| ScoredPassage {
                passage: entry.passage.clone(),
                score,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(doc: &str, seq: usize, text: &str) -> Passage {
        Passage {
            document: doc.to_string(),
            seq,
            text: text.to_string(),
        }
    }

    fn snapshot(entries: Vec<IndexedPassage>) -> IndexSnapshot {
        IndexSnapshot::new(entries, "fp".into(), "model".into(), 3)
    }

    #[test]
    fn identical_embedding_ranks_first() {
        let snap = snapshot(vec![
            IndexedPassage {
                passage: passage("a.txt", 0, "fees info"),
                embedding: vec![1.0, 0.0, 0.0],
            },
            IndexedPassage {
                passage: passage("a.txt", 1, "staff info"),
                embedding: vec![0.0, 1.0, 0.0],
            },
        ]);

        let results = snap.top_k(&[0.0, 1.0, 0.0], 1);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].passage.text, "staff info");
        assert!((results[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn ties_break_by_insertion_order() {
        let shared = vec![0.5, 0.5, 0.0];
        let snap = snapshot(vec![
            IndexedPassage {
                passage: passage("a.txt", 0, "first"),
                embedding: shared.clone(),
            },
            IndexedPassage {
                passage: passage("b.txt", 0, "second"),
                embedding: shared.clone(),
            },
        ]);

        let results = snap.top_k(&shared, 2);
        assert_eq!(results[0].passage.text, "first");
        assert_eq!(results[1].passage.text, "second");
    }

    #[test]
    fn k_larger_than_index_returns_everything() {
        let snap = snapshot(vec![IndexedPassage {
            passage: passage("a.txt", 0, "only"),
            embedding: vec![1.0, 0.0, 0.0],
        }]);
        assert_eq!(snap.top_k(&[1.0, 0.0, 0.0], 10).len(), 1);
    }

    #[test]
    fn empty_snapshot_returns_nothing() {
        let snap = snapshot(Vec::new());
        assert!(snap.top_k(&[1.0, 0.0, 0.0], 3).is_empty());
        assert!(snap.is_empty());
    }
}
