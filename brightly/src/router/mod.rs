//! Ordered, short-circuiting cascade of fast-path handlers with the
//! retrieval-augmented synthesizer as the terminal stage.

mod handlers;

use std::sync::Arc;
use std::sync::OnceLock;

use regex::Regex;

pub use handlers::{
    CapabilityHandler, EmotionHandler, FarewellHandler, GreetingHandler, IdentityHandler,
    MathHandler, QueryHandler,
};

use crate::llm::LlmProvider;
use crate::services::{AnswerSynthesizer, ConversationLog, SessionMemory};

fn separator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[?;]| and ").expect("sub-question separator regex"))
}

/// Split a raw question on sentence-terminal punctuation and the
/// conjunction "and". A question without separators passes through whole.
///
/// Deliberately over-eager: "fees and admission for class 5" splits too.
/// That mirrors the shipped behavior and stays until product says
/// otherwise.
pub fn split_subquestions(question: &str) -> Vec<String> {
    let lower = question.to_lowercase();
    if ![" and ", ";", "?"].iter().any(|sep| lower.contains(sep)) {
        return vec![question.trim().to_string()];
    }

    separator_regex()
        .split(question)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Routes each sub-question through the handler cascade in fixed order:
/// math, greeting, farewell, emotion, identity, capability, then the
/// synthesizer. The first non-empty answer wins.
pub struct QueryRouter {
    handlers: Vec<Box<dyn QueryHandler>>,
    synthesizer: AnswerSynthesizer,
    memory: Arc<SessionMemory>,
    conversation: Arc<ConversationLog>,
}

impl QueryRouter {
    pub fn new(
        llm: LlmProvider,
        synthesizer: AnswerSynthesizer,
        memory: Arc<SessionMemory>,
        conversation: Arc<ConversationLog>,
    ) -> Self {
        let handlers: Vec<Box<dyn QueryHandler>> = vec![
            Box::new(MathHandler),
            Box::new(GreetingHandler),
            Box::new(FarewellHandler),
            Box::new(EmotionHandler::new(llm)),
            Box::new(IdentityHandler),
            Box::new(CapabilityHandler),
        ];

        Self {
            handlers,
            synthesizer,
            memory,
            conversation,
        }
    }

    /// Answer a raw question: split, run the cascade per sub-question,
    /// join the answers with newlines in order.
    pub async fn route(&self, question: &str) -> String {
        let mut answers = Vec::new();
        for sub_question in split_subquestions(question) {
            answers.push(self.route_subquestion(&sub_question).await);
        }
        answers.join("\n")
    }

    async fn route_subquestion(&self, sub_question: &str) -> String {
        for handler in &self.handlers {
            if let Some(answer) = handler.try_handle(sub_question).await {
                tracing::debug!(handler = handler.name(), "Fast path answered");
                if handler.remember() {
                    self.record(sub_question, &answer).await;
                }
                return answer;
            }
        }

        let answer = self.synthesizer.answer(sub_question).await;
        self.record(sub_question, &answer).await;
        answer
    }

    async fn record(&self, question: &str, answer: &str) {
        self.memory.add(question, answer).await;
        self.conversation.append(question, answer);
    }

    pub fn conversation(&self) -> &ConversationLog {
        &self.conversation
    }
}
