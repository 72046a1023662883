//! Language-model integration for natural-language SQL generation
//!
//! [`LanguageModel`] is the prompt-to-completion seam used by the query
//! planner; [`LlmClient`] implements it against an OpenAI-compatible
//! chat-completions endpoint with retries on transient failures.

mod ai_types;
mod client;
mod error;
mod sql_prompt;

use async_trait::async_trait;

pub use ai_types::Message;
pub use client::{LlmClient, truncate};
pub use error::LlmError;
pub use sql_prompt::{SQL_SYSTEM_PROMPT, build_sql_messages};

/// Chat messages → completion text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, messages: Vec<Message>) -> Result<String, LlmError>;
}
