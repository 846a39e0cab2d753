use std::sync::Arc;

use crate::config::LlmConfig;
use crate::error::{BrightlyError, Result};
use crate::llm::api::LlmApiClient;

#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone)]
enum LlmBackend {
    Available,
    Unavailable { reason: String },
}

/// Handle to the generative text model. Constructed unavailable when no
/// model is configured; callers decide how to degrade.
#[derive(Debug, Clone)]
pub struct LlmProvider {
    backend: LlmBackend,
    config: Option<Arc<LlmConfig>>,
}

impl LlmProvider {
    pub fn new(config: Option<&LlmConfig>) -> Self {
        let Some(config) = config else {
            return Self::unavailable("No LLM configuration provided");
        };

        Self {
            backend: LlmBackend::Available,
            config: Some(Arc::new(config.clone())),
        }
    }

    pub fn unavailable(reason: &str) -> Self {
        Self {
            backend: LlmBackend::Unavailable {
                reason: reason.to_string(),
            },
            config: None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.backend, LlmBackend::Available)
    }

    pub fn config(&self) -> Option<&LlmConfig> {
        self.config.as_deref()
    }

    /// One chat completion: optional system message plus a user message.
    pub async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: Option<&CompletionOptions>,
    ) -> Result<String> {
        let config = match (&self.backend, self.config()) {
            (LlmBackend::Available, Some(config)) => config,
            (LlmBackend::Unavailable { reason }, _) => {
                return Err(BrightlyError::LlmUnavailable(reason.clone()));
            }
            _ => {
                return Err(BrightlyError::LlmUnavailable(
                    "No config available".to_string(),
                ));
            }
        };

        let client = LlmApiClient::new(config)?;
        client.complete(prompt, system_prompt, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_means_unavailable() {
        let provider = LlmProvider::new(None);
        assert!(!provider.is_available());
    }

    #[tokio::test]
    async fn unavailable_provider_refuses_completion() {
        let provider = LlmProvider::unavailable("no model");
        let err = provider.complete("hello", None, None).await.unwrap_err();
        assert!(matches!(err, BrightlyError::LlmUnavailable(_)));
    }

    #[test]
    fn configured_provider_is_available() {
        let config = LlmConfig {
            model: "gpt-4o-mini".to_string(),
            api_key: Some("key".to_string()),
            base_url: None,
            timeout_secs: 30,
            max_retries: 0,
            temperature: 0.2,
            max_tokens: 1024,
        };
        assert!(LlmProvider::new(Some(&config)).is_available());
    }
}
