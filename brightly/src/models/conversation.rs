use serde::{Deserialize, Serialize};

/// One short-term recall entry. The embedding is best-effort: a failed
/// embedding stores `None` and the entry is excluded from similarity
/// scoring but still persisted for literal replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub question: String,
    pub answer: String,
    pub embedding: Option<Vec<f32>>,
}

/// One question/answer turn, exposed verbatim as UI history.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
}
