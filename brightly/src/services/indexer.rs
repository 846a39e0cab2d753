use std::sync::Arc;

use crate::embeddings::EmbeddingProvider;
use crate::error::Result;
use crate::index::{IndexSnapshot, IndexedPassage, VectorIndex};
use crate::processing::TextChunker;
use crate::store::{manifest_fingerprint, DocumentMirror};

#[derive(Debug, Clone, serde::Serialize)]
pub struct RefreshSummary {
    pub changed: bool,
    pub documents: usize,
    pub passages: usize,
}

/// Owns the sync → chunk → embed → install lifecycle. Rebuilds happen off
/// the query path; readers keep the previous snapshot until the new one is
/// published.
pub struct IndexService {
    mirror: Arc<DocumentMirror>,
    chunker: TextChunker,
    embeddings: EmbeddingProvider,
    index: Arc<VectorIndex>,
}

impl IndexService {
    pub fn new(
        mirror: Arc<DocumentMirror>,
        chunker: TextChunker,
        embeddings: EmbeddingProvider,
        index: Arc<VectorIndex>,
    ) -> Self {
        Self {
            mirror,
            chunker,
            embeddings,
            index,
        }
    }

    /// Sync the mirror and make sure a current snapshot is being served.
    /// Rebuilds only when the sync reported changes, when no usable
    /// snapshot exists, or when `force` is set.
    pub async fn refresh(&self, force: bool) -> Result<RefreshSummary> {
        let changed = self.mirror.sync().await?;

        let manifest = self.mirror.load_manifest();
        let fingerprint = manifest_fingerprint(&manifest);
        let documents = manifest.len();

        if !force && !changed {
            if let Some(snapshot) = self.index.current() {
                if snapshot.fingerprint == fingerprint {
                    tracing::debug!("Serving cached index snapshot");
                    return Ok(RefreshSummary {
                        changed: false,
                        documents,
                        passages: snapshot.len(),
                    });
                }
            }

            // Nothing live yet: a persisted snapshot for this manifest is
            // as good as a rebuild.
            if self.index.load_if_matching(
                &fingerprint,
                self.embeddings.model(),
                self.embeddings.dimensions(),
            ) {
                let snapshot = self.index.current().expect("just installed");
                return Ok(RefreshSummary {
                    changed: false,
                    documents,
                    passages: snapshot.len(),
                });
            }
        }

        let passages = self.rebuild(&fingerprint).await?;
        Ok(RefreshSummary {
            changed: true,
            documents,
            passages,
        })
    }

    async fn rebuild(&self, fingerprint: &str) -> Result<usize> {
        let documents = self.mirror.load_documents()?;
        tracing::info!(documents = documents.len(), "Rebuilding vector index");

        let mut entries = Vec::new();
        for document in &documents {
            let passages = self.chunker.split(&document.path, &document.content);
            if passages.is_empty() {
                continue;
            }

            let texts: Vec<String> = passages.iter().map(|p| p.text.clone()).collect();
            let embeddings = self.embeddings.embed_batch(&texts).await;

            for (passage, embedding) in passages.into_iter().zip(embeddings) {
                entries.push(IndexedPassage { passage, embedding });
            }
        }

        let snapshot = IndexSnapshot::new(
            entries,
            fingerprint.to_string(),
            self.embeddings.model().to_string(),
            self.embeddings.dimensions(),
        );
        let passages = snapshot.len();

        if let Err(e) = self.index.persist(&snapshot) {
            tracing::warn!(error = %e, "Index persistence failed; continuing in memory");
        }
        self.index.install(Arc::new(snapshot));

        Ok(passages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EmbeddingsConfig, ProcessingConfig};
    use crate::store::{DocumentStore, FsDocumentStore};
    use tempfile::TempDir;

    struct Fixture {
        _workspace: TempDir,
        store: Arc<dyn DocumentStore>,
        service: IndexService,
        index: Arc<VectorIndex>,
        embeddings: EmbeddingProvider,
    }

    fn fixture() -> Fixture {
        let workspace = TempDir::new().unwrap();
        let remote_dir = workspace.path().join("remote");
        std::fs::create_dir_all(&remote_dir).unwrap();

        let store: Arc<dyn DocumentStore> = Arc::new(FsDocumentStore::new(&remote_dir));
        let mirror = Arc::new(DocumentMirror::new(
            store.clone(),
            workspace.path().join("data"),
            workspace.path().join("file_hashes.json"),
        ));
        let embeddings = EmbeddingProvider::new(&EmbeddingsConfig {
            model: "text-embedding-3-small".to_string(),
            dimensions: 64,
            api_key: None,
            base_url: None,
            timeout_secs: 5,
            max_retries: 0,
        })
        .unwrap();
        let index = Arc::new(VectorIndex::new(workspace.path().join("vector_index.json")));
        let chunker = TextChunker::new(&ProcessingConfig {
            chunk_size: 200,
            chunk_overlap: 40,
        });

        let service = IndexService::new(mirror, chunker, embeddings.clone(), index.clone());

        Fixture {
            _workspace: workspace,
            store,
            service,
            index,
            embeddings,
        }
    }

    #[tokio::test]
    async fn first_refresh_builds_and_installs() {
        let fx = fixture();
        fx.store
            .put("fees.txt", "Tuition is 50000 per year.")
            .await
            .unwrap();

        let summary = fx.service.refresh(false).await.unwrap();
        assert!(summary.changed);
        assert_eq!(summary.documents, 1);
        assert!(summary.passages >= 1);
        assert!(fx.index.current().is_some());
    }

    #[tokio::test]
    async fn unchanged_refresh_serves_the_cached_snapshot() {
        let fx = fixture();
        fx.store.put("fees.txt", "Tuition info.").await.unwrap();

        fx.service.refresh(false).await.unwrap();
        let first = fx.index.current().unwrap();

        let summary = fx.service.refresh(false).await.unwrap();
        assert!(!summary.changed);
        // Same Arc: nothing was rebuilt or reinstalled.
        assert!(Arc::ptr_eq(&first, &fx.index.current().unwrap()));
    }

    #[tokio::test]
    async fn force_refresh_rebuilds_without_changes() {
        let fx = fixture();
        fx.store.put("fees.txt", "Tuition info.").await.unwrap();
        fx.service.refresh(false).await.unwrap();
        let first = fx.index.current().unwrap();

        let summary = fx.service.refresh(true).await.unwrap();
        assert!(summary.changed);
        assert!(!Arc::ptr_eq(&first, &fx.index.current().unwrap()));
    }

    #[tokio::test]
    async fn changed_document_reindexes_new_content() {
        let fx = fixture();
        fx.store.put("fees.txt", "Old tuition details.").await.unwrap();
        fx.service.refresh(false).await.unwrap();

        fx.store
            .put("fees.txt", "New tuition details entirely.")
            .await
            .unwrap();
        let summary = fx.service.refresh(false).await.unwrap();
        assert!(summary.changed);

        let snapshot = fx.index.current().unwrap();
        assert!(snapshot
            .entries
            .iter()
            .all(|e| !e.passage.text.contains("Old tuition")));
        assert!(snapshot
            .entries
            .iter()
            .any(|e| e.passage.text.contains("New tuition")));
    }

    #[tokio::test]
    async fn deleted_document_drops_its_passages() {
        let fx = fixture();
        fx.store.put("fees.txt", "Tuition details.").await.unwrap();
        fx.store.put("staff.txt", "Principal details.").await.unwrap();
        fx.service.refresh(false).await.unwrap();

        fx.store.delete("staff.txt").await.unwrap();
        fx.service.refresh(false).await.unwrap();

        let snapshot = fx.index.current().unwrap();
        assert!(snapshot
            .entries
            .iter()
            .all(|e| e.passage.document != "staff.txt"));
    }

    #[tokio::test]
    async fn retrieval_finds_the_right_document() {
        let fx = fixture();
        fx.store
            .put("fees.txt", "Annual tuition is 50000 rupees.")
            .await
            .unwrap();
        fx.store
            .put("staff.txt", "The principal is Dr. Rao.")
            .await
            .unwrap();
        fx.service.refresh(false).await.unwrap();

        // The deterministic embedder guarantees an exact-text query embeds
        // identically to the indexed passage.
        let query = fx.embeddings.embed("Annual tuition is 50000 rupees.").await;
        let results = fx.index.query(&query, 1);
        assert_eq!(results[0].passage.document, "fees.txt");
    }

    #[tokio::test]
    async fn persisted_snapshot_loads_on_cold_start() {
        let fx = fixture();
        fx.store.put("fees.txt", "Tuition details.").await.unwrap();
        fx.service.refresh(false).await.unwrap();
        let passages = fx.index.current().unwrap().len();

        // Simulate a restart: a fresh VectorIndex over the same file.
        let cold_index = Arc::new(VectorIndex::new(
            fx._workspace.path().join("vector_index.json"),
        ));
        let mirror = Arc::new(DocumentMirror::new(
            fx.store.clone(),
            fx._workspace.path().join("data"),
            fx._workspace.path().join("file_hashes.json"),
        ));
        let service = IndexService::new(
            mirror,
            TextChunker::new(&ProcessingConfig {
                chunk_size: 200,
                chunk_overlap: 40,
            }),
            fx.embeddings.clone(),
            cold_index.clone(),
        );

        let summary = service.refresh(false).await.unwrap();
        assert!(!summary.changed);
        assert_eq!(cold_index.current().unwrap().len(), passages);
    }
}
