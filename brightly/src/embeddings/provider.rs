use crate::config::EmbeddingsConfig;
use crate::embeddings::{EmbeddingApiClient, FallbackEmbedder};
use crate::error::Result;

enum EmbeddingBackend {
    /// Remote model with the deterministic embedder as a per-request
    /// safety net.
    Remote { client: EmbeddingApiClient },
    /// No remote credentials configured; every embedding is hash-derived.
    FallbackOnly,
}

/// Facade over the remote embedding model and the deterministic fallback.
///
/// A failed remote call degrades that single request to the fallback
/// (no inline retry here; the API client owns retries), so callers never
/// see a provider error and the index never ends up partially built.
pub struct EmbeddingProvider {
    backend: EmbeddingBackend,
    fallback: FallbackEmbedder,
    model: String,
}

impl EmbeddingProvider {
    pub fn new(config: &EmbeddingsConfig) -> Result<Self> {
        let fallback = FallbackEmbedder::new(config.dimensions);

        let backend = if config.api_key.is_some() || config.base_url.is_some() {
            EmbeddingBackend::Remote {
                client: EmbeddingApiClient::new(config)?,
            }
        } else {
            tracing::warn!(
                "No embedding credentials configured; using deterministic fallback embeddings"
            );
            EmbeddingBackend::FallbackOnly
        };

        Ok(Self {
            backend,
            fallback,
            model: config.model.clone(),
        })
    }

    /// Embed a single text. Empty input maps to the zero vector; remote
    /// failures degrade to the deterministic embedder.
    pub async fn embed(&self, text: &str) -> Vec<f32> {
        if text.is_empty() {
            return vec![0.0; self.fallback.dimensions()];
        }

        match &self.backend {
            EmbeddingBackend::Remote { client } => match client.embed(&[text]).await {
                Ok(mut vectors) if !vectors.is_empty() => vectors.swap_remove(0),
                Ok(_) => {
                    tracing::warn!("Embedding response was empty; using fallback embedder");
                    self.fallback.embed(text)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Embedding call failed; using fallback embedder");
                    self.fallback.embed(text)
                }
            },
            EmbeddingBackend::FallbackOnly => self.fallback.embed(text),
        }
    }

    /// Embed many texts in one remote call; the whole batch degrades to
    /// the fallback when the call fails, keeping every vector in a batch
    /// from the same model.
    pub async fn embed_batch(&self, texts: &[String]) -> Vec<Vec<f32>> {
        if texts.is_empty() {
            return Vec::new();
        }

        match &self.backend {
            EmbeddingBackend::Remote { client } => {
                let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
                match client.embed(&refs).await {
                    Ok(vectors) if vectors.len() == texts.len() => vectors,
                    Ok(vectors) => {
                        tracing::warn!(
                            expected = texts.len(),
                            actual = vectors.len(),
                            "Embedding batch size mismatch; using fallback embedder"
                        );
                        texts.iter().map(|t| self.fallback.embed(t)).collect()
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Embedding batch failed; using fallback embedder");
                        texts.iter().map(|t| self.fallback.embed(t)).collect()
                    }
                }
            }
            EmbeddingBackend::FallbackOnly => {
                texts.iter().map(|t| self.fallback.embed(t)).collect()
            }
        }
    }

    pub fn dimensions(&self) -> usize {
        self.fallback.dimensions()
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Clone for EmbeddingProvider {
    fn clone(&self) -> Self {
        Self {
            backend: match &self.backend {
                EmbeddingBackend::Remote { client } => EmbeddingBackend::Remote {
                    client: client.clone(),
                },
                EmbeddingBackend::FallbackOnly => EmbeddingBackend::FallbackOnly,
            },
            fallback: self.fallback.clone(),
            model: self.model.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_config() -> EmbeddingsConfig {
        EmbeddingsConfig {
            model: "text-embedding-3-small".to_string(),
            dimensions: 512,
            api_key: None,
            base_url: None,
            timeout_secs: 5,
            max_retries: 0,
        }
    }

    #[tokio::test]
    async fn offline_provider_is_deterministic() {
        let provider = EmbeddingProvider::new(&offline_config()).unwrap();
        let a = provider.embed("what are the fees?").await;
        let b = provider.embed("what are the fees?").await;
        assert_eq!(a, b);
        assert_eq!(a.len(), 512);
    }

    #[tokio::test]
    async fn empty_text_embeds_to_zero_vector() {
        let provider = EmbeddingProvider::new(&offline_config()).unwrap();
        let v = provider.embed("").await;
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[tokio::test]
    async fn remote_failure_degrades_to_fallback() {
        // Backend points at a closed port, so every call fails fast and
        // the deterministic embedder answers instead.
        let config = EmbeddingsConfig {
            base_url: Some("http://127.0.0.1:1".to_string()),
            api_key: Some("key".to_string()),
            ..offline_config()
        };
        let provider = EmbeddingProvider::new(&config).unwrap();
        let v = provider.embed("fees").await;
        assert_eq!(v, FallbackEmbedder::new(512).embed("fees"));
    }

    #[tokio::test]
    async fn batch_matches_single_under_fallback() {
        let provider = EmbeddingProvider::new(&offline_config()).unwrap();
        let batch = provider
            .embed_batch(&["fees".to_string(), "staff".to_string()])
            .await;
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], provider.embed("fees").await);
        assert_eq!(batch[1], provider.embed("staff").await);
    }
}
