use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::error::{BrightlyError, Result};
use crate::index::{IndexSnapshot, ScoredPassage};

pub const DEFAULT_TOP_K: usize = 3;

/// Holder for the live index snapshot plus its on-disk form.
///
/// Reads clone the current `Arc` and never block on a rebuild; a build
/// works entirely off the lock and publishes with a single write
/// (copy-on-build, single writer / many readers).
pub struct VectorIndex {
    snapshot: RwLock<Option<Arc<IndexSnapshot>>>,
    index_path: PathBuf,
}

impl VectorIndex {
    pub fn new(index_path: impl Into<PathBuf>) -> Self {
        Self {
            snapshot: RwLock::new(None),
            index_path: index_path.into(),
        }
    }

    /// The last-installed snapshot, if any.
    pub fn current(&self) -> Option<Arc<IndexSnapshot>> {
        self.snapshot.read().expect("index lock poisoned").clone()
    }

    /// Atomically publish a new snapshot. In-flight readers keep the
    /// snapshot they already cloned.
    pub fn install(&self, snapshot: Arc<IndexSnapshot>) {
        tracing::info!(
            passages = snapshot.len(),
            fingerprint = %snapshot.fingerprint,
            "Installing index snapshot"
        );
        *self.snapshot.write().expect("index lock poisoned") = Some(snapshot);
    }

    /// Query the live snapshot. An absent snapshot is an empty result, not
    /// an error.
    pub fn query(&self, query_embedding: &[f32], k: usize) -> Vec<ScoredPassage> {
        match self.current() {
            Some(snapshot) => snapshot.top_k(query_embedding, k),
            None => Vec::new(),
        }
    }

    /// Serialize a snapshot to disk (temp file + rename).
    pub fn persist(&self, snapshot: &IndexSnapshot) -> Result<()> {
        let raw = serde_json::to_string(snapshot)?;
        let tmp = self.index_path.with_extension("json.tmp");
        std::fs::write(&tmp, raw)?;
        std::fs::rename(&tmp, &self.index_path)
            .map_err(|e| BrightlyError::Persistence(format!("Index replace failed: {e}")))?;
        Ok(())
    }

    /// Load the persisted snapshot and install it, but only when it was
    /// built from the given manifest fingerprint with the given model and
    /// dimensions. Any read, parse, or metadata mismatch degrades to
    /// `false` (callers rebuild instead of aborting startup).
    pub fn load_if_matching(&self, fingerprint: &str, model: &str, dimensions: usize) -> bool {
        let raw = match std::fs::read_to_string(&self.index_path) {
            Ok(raw) => raw,
            Err(_) => return false,
        };

        let snapshot: IndexSnapshot = match serde_json::from_str(&raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "Persisted index unreadable; will rebuild");
                return false;
            }
        };

        if snapshot.fingerprint != fingerprint {
            tracing::info!("Persisted index is stale (manifest changed); will rebuild");
            return false;
        }
        if snapshot.model != model || snapshot.dimensions != dimensions {
            tracing::info!(
                index_model = %snapshot.model,
                configured_model = %model,
                "Persisted index was built with a different embedding setup; will rebuild"
            );
            return false;
        }

        self.install(Arc::new(snapshot));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexedPassage;
    use crate::models::Passage;
    use tempfile::TempDir;

    fn snapshot(fingerprint: &str) -> IndexSnapshot {
        IndexSnapshot::new(
            vec![IndexedPassage {
                passage: Passage {
                    document: "fees.txt".into(),
                    seq: 0,
                    text: "Tuition is 50000.".into(),
                },
                embedding: vec![1.0, 0.0],
            }],
            fingerprint.into(),
            "text-embedding-3-small".into(),
            2,
        )
    }

    #[test]
    fn query_without_snapshot_is_empty() {
        let temp = TempDir::new().unwrap();
        let index = VectorIndex::new(temp.path().join("index.json"));
        assert!(index.query(&[1.0, 0.0], 3).is_empty());
        assert!(index.current().is_none());
    }

    #[test]
    fn persist_and_reload_round_trip() {
        let temp = TempDir::new().unwrap();
        let index = VectorIndex::new(temp.path().join("index.json"));

        let snap = snapshot("fp-1");
        index.persist(&snap).unwrap();

        assert!(index.load_if_matching("fp-1", "text-embedding-3-small", 2));
        let loaded = index.current().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.entries[0].passage.document, "fees.txt");
    }

    #[test]
    fn stale_fingerprint_is_rejected() {
        let temp = TempDir::new().unwrap();
        let index = VectorIndex::new(temp.path().join("index.json"));
        index.persist(&snapshot("fp-1")).unwrap();

        assert!(!index.load_if_matching("fp-2", "text-embedding-3-small", 2));
        assert!(index.current().is_none());
    }

    #[test]
    fn model_mismatch_is_rejected() {
        let temp = TempDir::new().unwrap();
        let index = VectorIndex::new(temp.path().join("index.json"));
        index.persist(&snapshot("fp-1")).unwrap();

        assert!(!index.load_if_matching("fp-1", "other-model", 2));
    }

    #[test]
    fn corrupt_file_degrades_to_rebuild() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.json");
        std::fs::write(&path, "{ not json").unwrap();

        let index = VectorIndex::new(&path);
        assert!(!index.load_if_matching("fp-1", "text-embedding-3-small", 2));
    }

    #[test]
    fn install_replaces_atomically_for_new_readers() {
        let temp = TempDir::new().unwrap();
        let index = VectorIndex::new(temp.path().join("index.json"));

        index.install(Arc::new(snapshot("fp-1")));
        let old = index.current().unwrap();

        index.install(Arc::new(snapshot("fp-2")));
        // The pre-swap reader still sees its snapshot.
        assert_eq!(old.fingerprint, "fp-1");
        assert_eq!(index.current().unwrap().fingerprint, "fp-2");
    }
}
