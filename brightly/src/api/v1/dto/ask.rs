use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::ConversationTurn;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, utoipa::ToSchema)]
pub struct AskRequest {
    #[validate(length(min = 1, max = 2000))]
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AskResponse {
    pub answer: String,
    /// Full conversation history for the UI, oldest first.
    pub history: Vec<ConversationTurn>,
}
