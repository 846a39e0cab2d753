use serde::Deserialize;
use std::env;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub embeddings: EmbeddingsConfig,
    pub processing: ProcessingConfig,
    pub memory: MemoryConfig,
    pub llm: Option<LlmConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Shared secret gating document mutations and admin routes.
    pub dashboard_password: String,
    pub refresh_on_startup: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base URL of the remote document store. Unset means the local
    /// `remote_dir` directory is treated as the authoritative store.
    pub remote_url: Option<String>,
    pub remote_dir: String,
    /// Local mirror of the remote document set.
    pub data_dir: String,
    pub manifest_path: String,
    pub index_path: String,
    pub sessions_dir: String,
    pub max_session_files: usize,
    pub password_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsConfig {
    pub model: String,
    pub dimensions: usize,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Q/A pairs recalled into the synthesizer context.
    pub recall_top_n: usize,
    /// Entries kept when the session log is written at shutdown.
    pub persist_limit: usize,
}

/// Chat model configuration. Absent entirely when no model is configured;
/// the service then runs with fixed degraded answers.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("BRIGHTLY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("BRIGHTLY_PORT", 8080),
                dashboard_password: env::var("DASHBOARD_PASSWORD")
                    .unwrap_or_else(|_| "change-me".to_string()),
                refresh_on_startup: parse_env_or("REFRESH_VECTORS_ON_STARTUP", true),
            },
            storage: StorageConfig {
                remote_url: env::var("DOCUMENT_STORE_URL").ok(),
                remote_dir: env::var("DOCUMENT_STORE_DIR")
                    .unwrap_or_else(|_| "store".to_string()),
                data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
                manifest_path: env::var("HASH_MANIFEST_PATH")
                    .unwrap_or_else(|_| "file_hashes.json".to_string()),
                index_path: env::var("VECTOR_INDEX_PATH")
                    .unwrap_or_else(|_| "vector_index.json".to_string()),
                sessions_dir: env::var("SESSIONS_DIR").unwrap_or_else(|_| "sessions".to_string()),
                max_session_files: parse_env_or("MAX_SESSION_FILES", 10),
                password_path: env::var("DASHBOARD_PASSWORD_PATH")
                    .unwrap_or_else(|_| "dashboard_password".to_string()),
            },
            embeddings: EmbeddingsConfig {
                model: env::var("EMBEDDING_MODEL")
                    .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
                dimensions: parse_env_or("EMBEDDING_DIMENSIONS", 512),
                api_key: env::var("OPENAI_API_KEY").ok(),
                base_url: env::var("EMBEDDING_BASE_URL").ok(),
                timeout_secs: parse_env_or("EMBEDDING_TIMEOUT_SECS", 30),
                max_retries: parse_env_or("EMBEDDING_MAX_RETRIES", 2),
            },
            processing: ProcessingConfig {
                chunk_size: parse_env_or("CHUNK_SIZE", 1200),
                chunk_overlap: parse_env_or("CHUNK_OVERLAP", 150),
            },
            memory: MemoryConfig {
                recall_top_n: parse_env_or("MEMORY_RECALL_TOP_N", 5),
                persist_limit: parse_env_or("SESSION_PERSIST_LIMIT", 50),
            },
            llm: llm_config_from_env(),
        }
    }
}

fn llm_config_from_env() -> Option<LlmConfig> {
    // A chat model needs either a key or an explicit local base URL.
    let api_key = env::var("OPENAI_API_KEY").ok();
    let base_url = env::var("OPENAI_BASE_URL").ok();
    if api_key.is_none() && base_url.is_none() {
        return None;
    }

    Some(LlmConfig {
        model: env::var("OPENAI_CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
        api_key,
        base_url,
        timeout_secs: parse_env_or("LLM_TIMEOUT_SECS", 60),
        max_retries: parse_env_or("LLM_MAX_RETRIES", 2),
        temperature: parse_env_or("LLM_TEMPERATURE", 0.2),
        max_tokens: parse_env_or("LLM_MAX_TOKENS", 1024),
    })
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn defaults_without_env() {
        std::env::remove_var("OPENAI_API_KEY");
        std::env::remove_var("OPENAI_BASE_URL");
        std::env::remove_var("CHUNK_SIZE");

        let config = Config::from_env();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.processing.chunk_size, 1200);
        assert_eq!(config.processing.chunk_overlap, 150);
        assert_eq!(config.embeddings.dimensions, 512);
        assert!(config.llm.is_none());
    }

    #[test]
    #[serial]
    fn invalid_numeric_env_falls_back() {
        std::env::set_var("CHUNK_SIZE", "not-a-number");
        let config = Config::from_env();
        assert_eq!(config.processing.chunk_size, 1200);
        std::env::remove_var("CHUNK_SIZE");
    }

    #[test]
    #[serial]
    fn llm_config_present_with_base_url_only() {
        std::env::remove_var("OPENAI_API_KEY");
        std::env::set_var("OPENAI_BASE_URL", "http://localhost:11434/v1");
        let config = Config::from_env();
        let llm = config.llm.expect("llm config");
        assert_eq!(llm.model, "gpt-4o-mini");
        assert!(llm.api_key.is_none());
        std::env::remove_var("OPENAI_BASE_URL");
    }
}
