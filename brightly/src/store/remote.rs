use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{BrightlyError, Result};
use crate::models::RemoteDocument;

/// The authoritative document store. The mirror and the CRUD handlers are
/// its only callers; everything else works off the local mirror.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Enumerate every object with its content.
    async fn list(&self) -> Result<Vec<RemoteDocument>>;

    /// Fetch a single object, `NotFound` when absent.
    async fn fetch(&self, id: &str) -> Result<String>;

    async fn put(&self, id: &str, content: &str) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct ObjectEntry {
    name: String,
}

/// HTTP object store client. The wire contract is a flat namespace:
/// `GET {base}/objects` lists names as JSON, object bodies are plain text
/// under `{base}/objects/{name}`.
pub struct HttpDocumentStore {
    client: Client,
    base_url: String,
}

impl HttpDocumentStore {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                BrightlyError::Internal(format!("Failed to create store HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn object_url(&self, id: &str) -> String {
        format!("{}/objects/{}", self.base_url, id)
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn list(&self) -> Result<Vec<RemoteDocument>> {
        let url = format!("{}/objects", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BrightlyError::SyncUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BrightlyError::SyncUnavailable(format!(
                "Listing returned {}",
                response.status()
            )));
        }

        let entries: Vec<ObjectEntry> = response
            .json()
            .await
            .map_err(|e| BrightlyError::SyncUnavailable(format!("Invalid listing: {e}")))?;

        let mut documents = Vec::with_capacity(entries.len());
        for entry in entries {
            let content = self.fetch(&entry.name).await?;
            documents.push(RemoteDocument {
                id: entry.name,
                content,
            });
        }

        Ok(documents)
    }

    async fn fetch(&self, id: &str) -> Result<String> {
        let response = self.client.get(self.object_url(id)).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(BrightlyError::NotFound(format!("Object '{id}' not found")));
        }

        let response = response.error_for_status()?;
        Ok(response.text().await?)
    }

    async fn put(&self, id: &str, content: &str) -> Result<()> {
        self.client
            .put(self.object_url(id))
            .header("content-type", "text/plain")
            .body(content.to_string())
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let response = self.client.delete(self.object_url(id)).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(BrightlyError::NotFound(format!("Object '{id}' not found")));
        }

        response.error_for_status()?;
        Ok(())
    }
}

/// Directory-backed store for local development and tests. The directory
/// plays the role of the remote bucket; nested paths are object names with
/// `/` separators.
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, id: &str) -> Result<PathBuf> {
        if id.split('/').any(|part| part == "..") {
            return Err(BrightlyError::Validation(format!(
                "Invalid object name '{id}'"
            )));
        }
        Ok(self.root.join(id))
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn list(&self) -> Result<Vec<RemoteDocument>> {
        if !self.root.is_dir() {
            return Err(BrightlyError::SyncUnavailable(format!(
                "Store directory '{}' does not exist",
                self.root.display()
            )));
        }

        let mut documents = Vec::new();
        for entry in walkdir::WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let rel = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|e| BrightlyError::Internal(e.to_string()))?;
            let id = rel.to_string_lossy().replace('\\', "/");
            let content = std::fs::read_to_string(entry.path())?;
            documents.push(RemoteDocument { id, content });
        }

        Ok(documents)
    }

    async fn fetch(&self, id: &str) -> Result<String> {
        let path = self.object_path(id)?;
        if !path.is_file() {
            return Err(BrightlyError::NotFound(format!("Object '{id}' not found")));
        }
        Ok(std::fs::read_to_string(path)?)
    }

    async fn put(&self, id: &str, content: &str) -> Result<()> {
        let path = self.object_path(id)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let path = self.object_path(id)?;
        if !path.is_file() {
            return Err(BrightlyError::NotFound(format!("Object '{id}' not found")));
        }
        std::fs::remove_file(path)?;
        Ok(())
    }
}

/// Strip any trailing `.txt`, replace spaces, lowercase, and append `.txt`
/// exactly once. Applied to user-supplied titles before they become object
/// names.
pub fn normalize_object_name(title: &str) -> String {
    let mut name = title.trim().to_string();
    if name.to_lowercase().ends_with(".txt") {
        name.truncate(name.len() - 4);
    }
    let mut name = name.replace(' ', "_").to_lowercase();
    name.push_str(".txt");
    name
}
