//! Grounded answer generation: fixed prompt assembly plus the streamed
//! language-model call. Accumulation of fragments into a final answer
//! happens at the consumer, not here.

use crate::error::ChatError;
use crate::llm::{ChatClient, ChatMessage, FragmentStream};

/// Refusal the model is instructed to use when the context does not contain
/// the answer.
pub const FALLBACK_PHRASE: &str = "I don't know, this information is not in the document.";

/// Returned without any model call when retrieval produced zero passages.
pub const NO_CONTEXT_ANSWER: &str =
    "I could not find any relevant information in the document.";

/// Replaces whatever partial text accumulated when the completion stream
/// fails, so the transcript stays consistent.
pub const GENERATION_FAILURE_ANSWER: &str =
    "Sorry, an error occurred while generating the answer.";

const SYSTEM_PROMPT: &str = "Answer the question using only the information in the context \
provided below. If the answer is not in the context, say \"I don't know, this information is \
not in the document.\" Never use outside knowledge and never make up an answer.";

pub enum GeneratedAnswer {
    /// Deterministic answer produced without a model call.
    Fixed(String),
    /// Incremental completion fragments, in arrival order.
    Stream(FragmentStream),
}

pub struct AnswerGenerator<C: ChatClient> {
    client: C,
    model: String,
}

impl<C: ChatClient> AnswerGenerator<C> {
    pub fn new(client: C, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Composes the grounded prompt and starts a streaming completion.
    /// Empty retrieval skips the model entirely.
    pub async fn generate(
        &self,
        passages: &[String],
        question: &str,
    ) -> Result<GeneratedAnswer, ChatError> {
        if passages.is_empty() {
            return Ok(GeneratedAnswer::Fixed(NO_CONTEXT_ANSWER.to_string()));
        }

        let messages = [
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_user_prompt(passages, question)),
        ];

        let stream = self.client.stream_chat(&self.model, &messages).await?;
        Ok(GeneratedAnswer::Stream(stream))
    }
}

fn build_user_prompt(passages: &[String], question: &str) -> String {
    format!(
        "Context:\n{}\n\nQuestion: {}\n\nAnswer:",
        passages.join("\n\n"),
        question
    )
}
