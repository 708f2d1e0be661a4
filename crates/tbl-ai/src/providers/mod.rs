//! Completion service clients

pub mod openai;

use crate::{CompletionResult, Message, Result};
use async_trait::async_trait;

pub use openai::OpenAIProvider;

/// A service that produces the next assistant message for a conversation
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send the whole conversation (system message first) and wait for the reply.
    /// Exactly one outbound request is made per call.
    async fn complete(&self, conversation: &[Message], model: &str) -> Result<CompletionResult>;
}
