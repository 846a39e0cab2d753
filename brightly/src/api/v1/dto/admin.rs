use serde::{Deserialize, Serialize};

use crate::services::RefreshSummary;

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RefreshResponse {
    /// Whether the document set changed and a rebuild ran.
    pub changed: bool,
    pub documents: usize,
    pub passages: usize,
}

impl From<RefreshSummary> for RefreshResponse {
    fn from(summary: RefreshSummary) -> Self {
        Self {
            changed: summary.changed,
            documents: summary.documents,
            passages: summary.passages,
        }
    }
}
