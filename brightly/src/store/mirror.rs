use std::collections::BTreeMap;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::error::{BrightlyError, Result};
use crate::models::Document;
use crate::store::DocumentStore;

/// Persisted path → content-hash map, the single source of truth for
/// change detection. A `BTreeMap` keeps the serialized form stable.
pub type HashManifest = BTreeMap<String, String>;

pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Digest of the whole manifest, stored inside index snapshots so a
/// persisted snapshot can be matched against the document set it was
/// built from.
pub fn manifest_fingerprint(manifest: &HashManifest) -> String {
    let mut hasher = Sha256::new();
    for (path, digest) in manifest {
        hasher.update(path.as_bytes());
        hasher.update(b":");
        hasher.update(digest.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

/// Local, hash-verified copy of the remote document set.
///
/// `sync` is fail-safe: an unreachable remote leaves the mirror untouched
/// and reports no change, so stale data is always preferred over data loss.
pub struct DocumentMirror {
    store: Arc<dyn DocumentStore>,
    data_dir: PathBuf,
    manifest_path: PathBuf,
}

impl DocumentMirror {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        data_dir: impl Into<PathBuf>,
        manifest_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            data_dir: data_dir.into(),
            manifest_path: manifest_path.into(),
        }
    }

    /// Pull the remote listing, apply adds/updates/deletes to the local
    /// mirror, and atomically replace the manifest with exactly the current
    /// remote set. Returns whether anything changed.
    pub async fn sync(&self) -> Result<bool> {
        let listing = match self.store.list().await {
            Ok(listing) => listing,
            Err(e) => {
                tracing::warn!(error = %e, "Remote listing unreachable; serving cached mirror");
                return Ok(false);
            }
        };

        std::fs::create_dir_all(&self.data_dir)?;

        let old_manifest = self.load_manifest();
        let mut new_manifest = HashManifest::new();
        let mut current: HashSet<String> = HashSet::new();
        let mut changed = false;

        for doc in listing.iter().filter(|d| d.id.ends_with(".txt")) {
            let digest = content_hash(&doc.content);
            current.insert(doc.id.clone());

            if old_manifest.get(&doc.id) != Some(&digest) {
                let local_path = self.data_dir.join(&doc.id);
                if let Some(parent) = local_path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&local_path, &doc.content)?;
                changed = true;
                tracing::info!(doc = %doc.id, "Updated local copy");
            }

            new_manifest.insert(doc.id.clone(), digest);
        }

        for (rel, path) in self.local_txt_files() {
            if !current.contains(&rel) {
                std::fs::remove_file(&path)?;
                changed = true;
                tracing::info!(doc = %rel, "Removed local copy");
            }
        }

        self.save_manifest(&new_manifest)?;

        if changed {
            tracing::info!("Document changes detected; index rebuild required");
        } else {
            tracing::debug!("No document changes detected");
        }

        Ok(changed)
    }

    /// Read the persisted manifest; missing or corrupt files degrade to an
    /// empty manifest (every remote document then counts as new).
    pub fn load_manifest(&self) -> HashManifest {
        match std::fs::read_to_string(&self.manifest_path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(manifest) => manifest,
                Err(e) => {
                    tracing::warn!(error = %e, "Corrupt hash manifest; treating all documents as new");
                    HashManifest::new()
                }
            },
            Err(_) => HashManifest::new(),
        }
    }

    fn save_manifest(&self, manifest: &HashManifest) -> Result<()> {
        let raw = serde_json::to_string_pretty(manifest)?;
        let tmp = self.manifest_path.with_extension("json.tmp");
        std::fs::write(&tmp, raw)?;
        std::fs::rename(&tmp, &self.manifest_path)
            .map_err(|e| BrightlyError::Persistence(format!("Manifest replace failed: {e}")))?;
        Ok(())
    }

    /// Load every mirrored document with its content hash, sorted by path.
    pub fn load_documents(&self) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        for (rel, path) in self.local_txt_files() {
            let content = std::fs::read_to_string(&path)?;
            let hash = content_hash(&content);
            documents.push(Document {
                path: rel,
                content,
                hash,
            });
        }
        documents.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(documents)
    }

    pub fn list_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.local_txt_files().into_iter().map(|(p, _)| p).collect();
        paths.sort();
        paths
    }

    fn local_txt_files(&self) -> Vec<(String, PathBuf)> {
        if !self.data_dir.is_dir() {
            return Vec::new();
        }

        walkdir::WalkDir::new(&self.data_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let rel = e
                    .path()
                    .strip_prefix(&self.data_dir)
                    .ok()?
                    .to_string_lossy()
                    .replace('\\', "/");
                rel.ends_with(".txt").then(|| (rel, e.path().to_path_buf()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FsDocumentStore;
    use tempfile::TempDir;

    struct Fixture {
        _workspace: TempDir,
        remote_dir: PathBuf,
        mirror: DocumentMirror,
        store: Arc<dyn DocumentStore>,
    }

    fn fixture() -> Fixture {
        let workspace = TempDir::new().unwrap();
        let remote_dir = workspace.path().join("remote");
        std::fs::create_dir_all(&remote_dir).unwrap();

        let store: Arc<dyn DocumentStore> = Arc::new(FsDocumentStore::new(&remote_dir));
        let mirror = DocumentMirror::new(
            store.clone(),
            workspace.path().join("data"),
            workspace.path().join("file_hashes.json"),
        );

        Fixture {
            _workspace: workspace,
            remote_dir,
            mirror,
            store,
        }
    }

    #[tokio::test]
    async fn first_sync_mirrors_everything() {
        let fx = fixture();
        fx.store.put("fees.txt", "Tuition is 50000.").await.unwrap();
        fx.store.put("notes.md", "ignored").await.unwrap();

        let changed = fx.mirror.sync().await.unwrap();
        assert!(changed);

        let docs = fx.mirror.load_documents().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].path, "fees.txt");
        assert_eq!(docs[0].content, "Tuition is 50000.");

        let manifest = fx.mirror.load_manifest();
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.get("fees.txt"), Some(&content_hash("Tuition is 50000.")));
    }

    #[tokio::test]
    async fn second_sync_without_changes_is_idempotent() {
        let fx = fixture();
        fx.store.put("fees.txt", "Tuition is 50000.").await.unwrap();

        assert!(fx.mirror.sync().await.unwrap());
        let manifest_before = fx.mirror.load_manifest();
        let docs_before = fx.mirror.load_documents().unwrap();

        assert!(!fx.mirror.sync().await.unwrap());
        assert_eq!(fx.mirror.load_manifest(), manifest_before);
        let docs_after = fx.mirror.load_documents().unwrap();
        assert_eq!(docs_after.len(), docs_before.len());
        assert_eq!(docs_after[0].hash, docs_before[0].hash);
    }

    #[tokio::test]
    async fn changed_content_is_detected_and_rewritten() {
        let fx = fixture();
        fx.store.put("fees.txt", "old fees").await.unwrap();
        fx.mirror.sync().await.unwrap();

        fx.store.put("fees.txt", "new fees").await.unwrap();
        assert!(fx.mirror.sync().await.unwrap());

        let docs = fx.mirror.load_documents().unwrap();
        assert_eq!(docs[0].content, "new fees");
        assert_eq!(
            fx.mirror.load_manifest().get("fees.txt"),
            Some(&content_hash("new fees"))
        );
    }

    #[tokio::test]
    async fn remote_deletion_propagates_and_prunes_manifest() {
        let fx = fixture();
        fx.store.put("fees.txt", "fees").await.unwrap();
        fx.store.put("staff.txt", "staff").await.unwrap();
        fx.mirror.sync().await.unwrap();

        fx.store.delete("staff.txt").await.unwrap();
        assert!(fx.mirror.sync().await.unwrap());

        let docs = fx.mirror.load_documents().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].path, "fees.txt");
        assert!(!fx.mirror.load_manifest().contains_key("staff.txt"));
    }

    #[tokio::test]
    async fn unreachable_remote_keeps_local_mirror() {
        let fx = fixture();
        fx.store.put("fees.txt", "fees").await.unwrap();
        fx.mirror.sync().await.unwrap();

        // Removing the backing directory makes the listing fail outright.
        std::fs::remove_dir_all(&fx.remote_dir).unwrap();

        let changed = fx.mirror.sync().await.unwrap();
        assert!(!changed);
        assert_eq!(fx.mirror.load_documents().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn nested_paths_round_trip() {
        let fx = fixture();
        fx.store
            .put("staff/principal.txt", "Dr. Rao")
            .await
            .unwrap();
        fx.mirror.sync().await.unwrap();

        let docs = fx.mirror.load_documents().unwrap();
        assert_eq!(docs[0].path, "staff/principal.txt");
    }

    #[test]
    fn fingerprint_tracks_manifest_content() {
        let mut a = HashManifest::new();
        a.insert("x.txt".into(), "abc".into());
        let fp1 = manifest_fingerprint(&a);

        a.insert("y.txt".into(), "def".into());
        let fp2 = manifest_fingerprint(&a);
        assert_ne!(fp1, fp2);

        let b: HashManifest = a.clone();
        assert_eq!(manifest_fingerprint(&b), fp2);
    }
}
