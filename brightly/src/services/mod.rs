mod indexer;
mod memory;
mod synthesizer;

pub use indexer::{IndexService, RefreshSummary};
pub use memory::{cleanup_old_sessions, ConversationLog, SessionMemory};
pub use synthesizer::AnswerSynthesizer;
