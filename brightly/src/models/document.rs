use serde::{Deserialize, Serialize};

/// A document mirrored from the remote store. Identity is the relative
/// path within the store; the hash is the SHA-256 digest of the content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub path: String,
    pub content: String,
    pub hash: String,
}

/// One enumeration entry from the remote store listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteDocument {
    pub id: String,
    pub content: String,
}

/// A bounded chunk of one document, the unit of retrieval. Regenerated
/// wholesale whenever the owning document's hash changes; never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub document: String,
    pub seq: usize,
    pub text: String,
}
