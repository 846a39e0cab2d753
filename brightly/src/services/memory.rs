use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::Utc;

use crate::embeddings::{cosine_similarity, EmbeddingProvider};
use crate::error::{BrightlyError, Result};
use crate::models::{ConversationTurn, MemoryEntry};

/// Append-only short-term recall over the current process lifetime.
/// Unbounded in memory; truncated to `persist_limit` entries when the
/// session log is written at shutdown.
pub struct SessionMemory {
    entries: RwLock<Vec<MemoryEntry>>,
    embeddings: EmbeddingProvider,
    persist_limit: usize,
}

impl SessionMemory {
    pub fn new(embeddings: EmbeddingProvider, persist_limit: usize) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            embeddings,
            persist_limit,
        }
    }

    /// Record a Q/A pair. The question embedding is best-effort: entries
    /// without one are kept for replay but never scored.
    pub async fn add(&self, question: &str, answer: &str) {
        let embedding = Some(self.embeddings.embed(question).await);
        self.push(MemoryEntry {
            question: question.to_string(),
            answer: answer.to_string(),
            embedding,
        });
    }

    pub(crate) fn push(&self, entry: MemoryEntry) {
        self.entries.write().expect("memory lock poisoned").push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("memory lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Most similar stored Q/A pairs, formatted for prompt context.
    /// Entries tie-break toward recency. Empty memory yields an empty
    /// string.
    pub async fn retrieve(&self, question: &str, top_n: usize) -> String {
        if self.is_empty() || top_n == 0 {
            return String::new();
        }

        let query = self.embeddings.embed(question).await;

        let entries = self.entries.read().expect("memory lock poisoned");
        let mut scored: Vec<(f32, usize)> = entries
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| {
                entry
                    .embedding
                    .as_ref()
                    .map(|e| (cosine_similarity(&query, e), i))
            })
            .collect();

        // Descending score; later (more recent) entries win ties.
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.1.cmp(&a.1))
        });

        scored
            .into_iter()
            .take(top_n)
            .map(|(_, i)| format!("Q: {}\nA: {}", entries[i].question, entries[i].answer))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Write the most recent entries as a timestamped session file and
    /// return its path.
    pub fn persist(&self, sessions_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(sessions_dir)?;

        let entries = self.entries.read().expect("memory lock poisoned");
        let start = entries.len().saturating_sub(self.persist_limit);
        let turns: Vec<ConversationTurn> = entries[start..]
            .iter()
            .map(|e| ConversationTurn {
                question: e.question.clone(),
                answer: e.answer.clone(),
            })
            .collect();

        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let path = sessions_dir.join(format!("session_{timestamp}.json"));
        let raw = serde_json::to_string_pretty(&turns)?;
        std::fs::write(&path, raw)
            .map_err(|e| BrightlyError::Persistence(format!("Session write failed: {e}")))?;

        Ok(path)
    }
}

/// Remove the oldest session files beyond `max_files`. Failures are
/// logged, never raised.
pub fn cleanup_old_sessions(sessions_dir: &Path, max_files: usize) {
    let mut files: Vec<(std::time::SystemTime, PathBuf)> = match std::fs::read_dir(sessions_dir) {
        Ok(dir) => dir
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
            .filter_map(|e| {
                let modified = e.metadata().ok()?.modified().ok()?;
                Some((modified, e.path()))
            })
            .collect(),
        Err(_) => return,
    };

    files.sort_by_key(|(modified, _)| *modified);

    if files.len() <= max_files {
        return;
    }

    let excess = files.len() - max_files;
    for (_, path) in files.into_iter().take(excess) {
        match std::fs::remove_file(&path) {
            Ok(()) => tracing::info!(file = %path.display(), "Deleted old session"),
            Err(e) => tracing::warn!(file = %path.display(), error = %e, "Session cleanup failed"),
        }
    }
}

/// Ordered question/answer history returned verbatim to the caller.
#[derive(Default)]
pub struct ConversationLog {
    turns: RwLock<Vec<ConversationTurn>>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, question: &str, answer: &str) {
        self.turns
            .write()
            .expect("conversation lock poisoned")
            .push(ConversationTurn {
                question: question.to_string(),
                answer: answer.to_string(),
            });
    }

    pub fn history(&self) -> Vec<ConversationTurn> {
        self.turns
            .read()
            .expect("conversation lock poisoned")
            .clone()
    }

    /// The most recently recorded question, for the "what did I just ask"
    /// meta-query.
    pub fn last_question(&self) -> Option<String> {
        self.turns
            .read()
            .expect("conversation lock poisoned")
            .last()
            .map(|t| t.question.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbeddingsConfig;
    use tempfile::TempDir;

    fn offline_embeddings() -> EmbeddingProvider {
        EmbeddingProvider::new(&EmbeddingsConfig {
            model: "text-embedding-3-small".to_string(),
            dimensions: 64,
            api_key: None,
            base_url: None,
            timeout_secs: 5,
            max_retries: 0,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn recall_returns_the_stored_pair() {
        let memory = SessionMemory::new(offline_embeddings(), 50);
        memory.add("capital of X", "Y").await;

        let recalled = memory.retrieve("capital of X", 1).await;
        assert!(recalled.contains("capital of X"));
        assert!(recalled.contains("Y"));
    }

    #[tokio::test]
    async fn empty_memory_recalls_nothing() {
        let memory = SessionMemory::new(offline_embeddings(), 50);
        assert_eq!(memory.retrieve("anything", 5).await, "");
    }

    #[tokio::test]
    async fn entries_without_embeddings_are_not_scored() {
        let memory = SessionMemory::new(offline_embeddings(), 50);
        memory.push(MemoryEntry {
            question: "unscored".into(),
            answer: "answer".into(),
            embedding: None,
        });
        memory.add("scored question", "scored answer").await;

        let recalled = memory.retrieve("scored question", 5).await;
        assert!(recalled.contains("scored question"));
        assert!(!recalled.contains("unscored"));
    }

    #[tokio::test]
    async fn ties_prefer_recent_entries() {
        let memory = SessionMemory::new(offline_embeddings(), 50);
        // Identical questions produce identical fallback embeddings, so the
        // scores tie exactly.
        memory.add("same question", "older answer").await;
        memory.add("same question", "newer answer").await;

        let recalled = memory.retrieve("same question", 1).await;
        assert!(recalled.contains("newer answer"));
    }

    #[tokio::test]
    async fn persistence_truncates_to_the_limit() {
        let temp = TempDir::new().unwrap();
        let memory = SessionMemory::new(offline_embeddings(), 3);
        for i in 0..10 {
            memory.add(&format!("q{i}"), &format!("a{i}")).await;
        }

        let path = memory.persist(temp.path()).unwrap();
        let raw = std::fs::read_to_string(path).unwrap();
        let turns: Vec<ConversationTurn> = serde_json::from_str(&raw).unwrap();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].question, "q7");
        assert_eq!(turns[2].question, "q9");
    }

    #[test]
    fn cleanup_keeps_the_newest_files() {
        let temp = TempDir::new().unwrap();
        for i in 0..5 {
            let path = temp.path().join(format!("session_{i}.json"));
            std::fs::write(&path, "[]").unwrap();
            // Stagger modification times so ordering is deterministic.
            let time = std::time::SystemTime::now() - std::time::Duration::from_secs(100 - i);
            let file = std::fs::File::options().write(true).open(&path).unwrap();
            file.set_modified(time).unwrap();
        }

        cleanup_old_sessions(temp.path(), 2);

        let remaining: Vec<_> = std::fs::read_dir(temp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().into_string().unwrap())
            .collect();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.contains(&"session_3.json".to_string()));
        assert!(remaining.contains(&"session_4.json".to_string()));
    }

    #[test]
    fn conversation_log_tracks_last_question() {
        let log = ConversationLog::new();
        assert!(log.last_question().is_none());

        log.append("first?", "one");
        log.append("second?", "two");

        assert_eq!(log.last_question().unwrap(), "second?");
        assert_eq!(log.history().len(), 2);
    }
}
