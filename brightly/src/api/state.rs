use std::sync::{Arc, RwLock};

use crate::config::Config;
use crate::embeddings::EmbeddingProvider;
use crate::index::VectorIndex;
use crate::llm::LlmProvider;
use crate::processing::TextChunker;
use crate::router::QueryRouter;
use crate::services::{AnswerSynthesizer, ConversationLog, IndexService, SessionMemory};
use crate::store::{DocumentMirror, DocumentStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn DocumentStore>,
    pub mirror: Arc<DocumentMirror>,
    pub index: Arc<VectorIndex>,
    pub indexer: Arc<IndexService>,
    pub embeddings: EmbeddingProvider,
    pub llm: LlmProvider,
    pub memory: Arc<SessionMemory>,
    pub conversation: Arc<ConversationLog>,
    pub router: Arc<QueryRouter>,
    /// Current shared secret; mutable at runtime via the password endpoint.
    pub dashboard_password: Arc<RwLock<String>>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn DocumentStore>,
        embeddings: EmbeddingProvider,
        llm: LlmProvider,
    ) -> Self {
        let config = Arc::new(config);

        let mirror = Arc::new(DocumentMirror::new(
            store.clone(),
            &config.storage.data_dir,
            &config.storage.manifest_path,
        ));
        let index = Arc::new(VectorIndex::new(&config.storage.index_path));
        let indexer = Arc::new(IndexService::new(
            mirror.clone(),
            TextChunker::new(&config.processing),
            embeddings.clone(),
            index.clone(),
        ));

        let memory = Arc::new(SessionMemory::new(
            embeddings.clone(),
            config.memory.persist_limit,
        ));
        let conversation = Arc::new(ConversationLog::new());

        let synthesizer = AnswerSynthesizer::new(
            llm.clone(),
            embeddings.clone(),
            index.clone(),
            memory.clone(),
            conversation.clone(),
            config.memory.recall_top_n,
        );
        let router = Arc::new(QueryRouter::new(
            llm.clone(),
            synthesizer,
            memory.clone(),
            conversation.clone(),
        ));

        // A password changed at runtime persists to the state file and
        // outlives the environment default.
        let password = std::fs::read_to_string(&config.storage.password_path)
            .map(|p| p.trim().to_string())
            .ok()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| config.server.dashboard_password.clone());

        Self {
            config,
            store,
            mirror,
            index,
            indexer,
            embeddings,
            llm,
            memory,
            conversation,
            router,
            dashboard_password: Arc::new(RwLock::new(password)),
        }
    }

    pub fn current_password(&self) -> String {
        self.dashboard_password
            .read()
            .expect("password lock poisoned")
            .clone()
    }
}
