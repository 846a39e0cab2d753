use async_trait::async_trait;
use rand::seq::SliceRandom;
use regex::Regex;

use crate::llm::{prompts, CompletionOptions, LlmProvider};
use crate::math;

/// One fast-path stage in the cascade. The first handler returning
/// `Some` wins; `None` falls through to the next stage.
#[async_trait]
pub trait QueryHandler: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether a produced answer is recorded to session memory and the
    /// conversation log. Pleasantries are not.
    fn remember(&self) -> bool {
        true
    }

    async fn try_handle(&self, question: &str) -> Option<String>;
}

/// Stage 1: canned concept answers, step explanations, then the direct
/// evaluator.
pub struct MathHandler;

#[async_trait]
impl QueryHandler for MathHandler {
    fn name(&self) -> &'static str {
        "math"
    }

    async fn try_handle(&self, question: &str) -> Option<String> {
        if !math::is_math_query(question) {
            return None;
        }

        math::concept_answer(question)
            .or_else(|| math::explain_step_by_step(question))
            .or_else(|| math::solve_expression(question))
    }
}

const GREETINGS: &[&str] = &[
    "hello",
    "hi",
    "hey",
    "good morning",
    "good afternoon",
    "good evening",
];

pub struct GreetingHandler;

#[async_trait]
impl QueryHandler for GreetingHandler {
    fn name(&self) -> &'static str {
        "greeting"
    }

    fn remember(&self) -> bool {
        false
    }

    async fn try_handle(&self, question: &str) -> Option<String> {
        let lower = question.to_lowercase();
        GREETINGS.iter().any(|g| lower.contains(g)).then(|| {
            "Welcome to ABC School! I'm Brightly, your assistant. How can I help you today?"
                .to_string()
        })
    }
}

const FAREWELLS: &[&str] = &["bye", "goodbye", "see you", "farewell"];

pub struct FarewellHandler;

#[async_trait]
impl QueryHandler for FarewellHandler {
    fn name(&self) -> &'static str {
        "farewell"
    }

    fn remember(&self) -> bool {
        false
    }

    async fn try_handle(&self, question: &str) -> Option<String> {
        let lower = question.to_lowercase();
        FAREWELLS
            .iter()
            .any(|f| lower.contains(f))
            .then(|| "Goodbye! Have a great day 🌟 Come back soon!".to_string())
    }
}

const FACTUAL_KEYWORDS: &[&str] = &[
    "what", "where", "when", "how", "who", "which", "fee", "fees", "address", "location",
    "principal", "teacher", "school", "exam", "contact", "number", "subject", "student", "class",
    "admission",
];

const EXPRESSIVE_EMOJI: &[&str] = &["💡", "😊", "😄", "🎉", "🥳"];

const AFFIRMING_REPLIES: &[&str] = &[
    "That's really kind of you, thank you 😊",
    "Glad to hear that! You're awesome!",
    "That made my day 😄",
    "You're too sweet — thanks a lot!",
    "Aww, I appreciate that 💫",
];

/// Stage 4: sentiment classification for non-factual messages. Factual
/// keywords and already-expressive emoji skip the model call entirely.
pub struct EmotionHandler {
    llm: LlmProvider,
    factual: Regex,
}

impl EmotionHandler {
    pub fn new(llm: LlmProvider) -> Self {
        let pattern = format!(r"\b(?:{})\b", FACTUAL_KEYWORDS.join("|"));
        Self {
            llm,
            factual: Regex::new(&pattern).expect("factual keyword regex"),
        }
    }
}

#[async_trait]
impl QueryHandler for EmotionHandler {
    fn name(&self) -> &'static str {
        "emotion"
    }

    fn remember(&self) -> bool {
        false
    }

    async fn try_handle(&self, question: &str) -> Option<String> {
        if self.factual.is_match(&question.to_lowercase()) {
            return None;
        }
        if EXPRESSIVE_EMOJI.iter().any(|e| question.contains(e)) {
            return None;
        }

        let options = CompletionOptions {
            temperature: Some(0.0),
            max_tokens: Some(32),
        };
        let verdict = match self
            .llm
            .complete(&prompts::sentiment_prompt(question), None, Some(&options))
            .await
        {
            Ok(text) => text.trim().to_lowercase(),
            Err(e) => {
                tracing::warn!(error = %e, "Emotion detection failed");
                return None;
            }
        };

        if verdict.starts_with("positive") {
            let reply = AFFIRMING_REPLIES
                .choose(&mut rand::thread_rng())
                .copied()
                .unwrap_or(AFFIRMING_REPLIES[0]);
            return Some(reply.to_string());
        }
        if verdict.starts_with("negative") {
            return Some("I'm sorry if something felt off. Let's fix it together.".to_string());
        }

        None
    }
}

const IDENTITY_PHRASES: &[&str] = &["who are you", "your name", "what are you", "who created you"];

pub struct IdentityHandler;

#[async_trait]
impl QueryHandler for IdentityHandler {
    fn name(&self) -> &'static str {
        "identity"
    }

    async fn try_handle(&self, question: &str) -> Option<String> {
        let lower = question.to_lowercase();
        IDENTITY_PHRASES
            .iter()
            .any(|p| lower.contains(p))
            .then(|| "I'm Brightly — your friendly ABC Senior Secondary School assistant.".to_string())
    }
}

const CAPABILITY_WORDS: &[&str] = &["provide", "offer", "help", "assist", "what can you"];

const CAPABILITY_REPLIES: &[&str] = &[
    "I can help you with school details, fees, admissions, exams, and staff information.",
    "I assist with queries about ABC Senior Secondary School — like fees, staff, or classes.",
    "I provide details about school activities, admissions, and academic info.",
    "I'm here to share school-related information and help you find what you need!",
];

pub struct CapabilityHandler;

#[async_trait]
impl QueryHandler for CapabilityHandler {
    fn name(&self) -> &'static str {
        "capability"
    }

    async fn try_handle(&self, question: &str) -> Option<String> {
        let lower = question.to_lowercase();
        CAPABILITY_WORDS.iter().any(|w| lower.contains(w)).then(|| {
            CAPABILITY_REPLIES
                .choose(&mut rand::thread_rng())
                .copied()
                .unwrap_or(CAPABILITY_REPLIES[0])
                .to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn math_handler_evaluates_expressions() {
        let answer = MathHandler.try_handle("2+2").await.unwrap();
        assert_eq!(answer, "The result is 4");
    }

    #[tokio::test]
    async fn math_handler_ignores_prose() {
        assert!(MathHandler.try_handle("who is the principal").await.is_none());
        // The detector fires on the digit, but no stage can parse it.
        assert!(MathHandler.try_handle("fees for class 5").await.is_none());
    }

    #[tokio::test]
    async fn math_handler_prefers_step_explanations() {
        let answer = MathHandler
            .try_handle("differentiate of x^2")
            .await
            .unwrap();
        assert!(answer.contains("derivative"));
    }

    #[tokio::test]
    async fn greeting_matches_substrings() {
        let answer = GreetingHandler.try_handle("hello?").await.unwrap();
        assert!(answer.contains("Brightly"));
        assert!(GreetingHandler.try_handle("what are the fees").await.is_none());
        assert!(!GreetingHandler.remember());
    }

    #[tokio::test]
    async fn farewell_matches_vocabulary() {
        assert!(FarewellHandler
            .try_handle("ok bye now")
            .await
            .unwrap()
            .contains("Goodbye"));
    }

    #[tokio::test]
    async fn emotion_skips_factual_questions() {
        let handler = EmotionHandler::new(LlmProvider::unavailable("test"));
        assert!(handler.try_handle("what are the fees?").await.is_none());
    }

    #[tokio::test]
    async fn emotion_skips_expressive_emoji() {
        let handler = EmotionHandler::new(LlmProvider::unavailable("test"));
        assert!(handler.try_handle("love this 😊").await.is_none());
    }

    #[tokio::test]
    async fn emotion_degrades_to_none_without_model() {
        let handler = EmotionHandler::new(LlmProvider::unavailable("test"));
        assert!(handler.try_handle("you are wonderful").await.is_none());
    }

    #[tokio::test]
    async fn identity_and_capability_phrases() {
        assert!(IdentityHandler
            .try_handle("who are you exactly")
            .await
            .unwrap()
            .contains("Brightly"));
        assert!(CapabilityHandler
            .try_handle("what can you do")
            .await
            .is_some());
        assert!(IdentityHandler.try_handle("fees please").await.is_none());
    }
}
