use async_trait::async_trait;

use crate::error::ServiceError;
use crate::prompt::Prompt;

/// Anything that can turn a prompt into answer text.
///
/// Implementations make a single attempt; retries and the overall timeout
/// belong to [`crate::AgentRunner`].
#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn generate(&self, prompt: &Prompt) -> Result<String, ServiceError>;
}
