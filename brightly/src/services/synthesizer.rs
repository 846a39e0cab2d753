use std::sync::Arc;
use std::sync::OnceLock;

use regex::Regex;

use crate::embeddings::EmbeddingProvider;
use crate::index::{VectorIndex, DEFAULT_TOP_K};
use crate::llm::{prompts, CompletionOptions, LlmProvider};
use crate::services::{ConversationLog, SessionMemory};

fn meta_question_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)what did i (just )?ask").expect("meta-question regex"))
}

/// Terminal cascade stage: assemble retrieved passages and recalled
/// conversation into a grounded prompt and ask the generative model.
/// Always produces an answer; model failure degrades to a fixed message.
pub struct AnswerSynthesizer {
    llm: LlmProvider,
    embeddings: EmbeddingProvider,
    index: Arc<VectorIndex>,
    memory: Arc<SessionMemory>,
    conversation: Arc<ConversationLog>,
    recall_top_n: usize,
    temperature: f32,
    max_tokens: u32,
}

impl AnswerSynthesizer {
    pub fn new(
        llm: LlmProvider,
        embeddings: EmbeddingProvider,
        index: Arc<VectorIndex>,
        memory: Arc<SessionMemory>,
        conversation: Arc<ConversationLog>,
        recall_top_n: usize,
    ) -> Self {
        let (temperature, max_tokens) = match llm.config() {
            Some(config) => (config.temperature, config.max_tokens),
            None => (0.2, 1024),
        };

        Self {
            llm,
            embeddings,
            index,
            memory,
            conversation,
            recall_top_n,
            temperature,
            max_tokens,
        }
    }

    pub async fn answer(&self, question: &str) -> String {
        // "What did I just ask" is answered from the log verbatim, not
        // from the model.
        if meta_question_regex().is_match(question) {
            return match self.conversation.last_question() {
                Some(previous) => previous,
                None => "You haven't asked me anything yet.".to_string(),
            };
        }

        let context = self.assemble_context(question).await;
        let prompt = prompts::answer_prompt(&context, question);

        let options = CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
        };

        match self
            .llm
            .complete(&prompt, Some(prompts::ANSWER_SYSTEM_PROMPT), Some(&options))
            .await
        {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(error = %e, "Answer generation failed");
                prompts::DEGRADED_ANSWER.to_string()
            }
        }
    }

    async fn assemble_context(&self, question: &str) -> String {
        let query_embedding = self.embeddings.embed(question).await;

        let mut context = String::new();
        for hit in self.index.query(&query_embedding, DEFAULT_TOP_K) {
            context.push_str(&hit.passage.text);
            context.push('\n');
        }

        let recalled = self.memory.retrieve(question, self.recall_top_n).await;
        if !recalled.is_empty() {
            context.push_str("\n--- Previous conversation ---\n");
            context.push_str(&recalled);
        }

        if context.trim().is_empty() {
            prompts::NO_DATA_CONTEXT.to_string()
        } else {
            context
        }
    }
}
