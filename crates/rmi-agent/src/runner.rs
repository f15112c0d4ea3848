//! Question answering with bounded retries and an overall timeout.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rmi_metrics::ContextObject;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AgentError;
use crate::prompt::Prompt;
use crate::retry::retry_with_backoff;
use crate::service::ReasoningService;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;

/// A grounded answer to one question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub request_id: Uuid,
    pub restaurant: String,
    pub question: String,
    pub text: String,
    /// SHA-256 of the exact prompt sent; equal for equal question and context.
    pub prompt_fingerprint: String,
    /// Service calls made, including the successful one.
    pub attempts: u32,
    pub generated_at: DateTime<Utc>,
}

/// Runs questions against a [`ReasoningService`].
///
/// The runner only reads the context it is given. Dropping the future
/// returned by [`AgentRunner::run`] cancels the in-flight request.
#[derive(Clone)]
pub struct AgentRunner {
    service: Arc<dyn ReasoningService>,
    timeout: Duration,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl std::fmt::Debug for AgentRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRunner")
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .finish_non_exhaustive()
    }
}

impl AgentRunner {
    #[must_use]
    pub fn new(service: Arc<dyn ReasoningService>) -> Self {
        Self {
            service,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        }
    }

    /// Upper bound on the whole run, retries and back-off included.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Answers `question` using only `context`.
    ///
    /// The prompt carries the context's own copy of the question, which may
    /// have been shortened to fit the context budget. `question` is kept
    /// verbatim on the returned [`Answer`].
    ///
    /// # Errors
    ///
    /// - [`AgentError::EmptyQuestion`] if `question` is blank; the service is
    ///   not called.
    /// - [`AgentError::Unavailable`] if the service fails after retries,
    ///   returns an empty answer, or the timeout elapses.
    /// - [`AgentError::Prompt`] if the context cannot be encoded.
    pub async fn run(&self, question: &str, context: &ContextObject) -> Result<Answer, AgentError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AgentError::EmptyQuestion);
        }

        let request_id = Uuid::new_v4();
        let prompt = Prompt::build(context)?;
        let prompt_fingerprint = prompt.fingerprint();
        tracing::info!(
            %request_id,
            restaurant = %context.restaurant,
            prompt_fingerprint = %prompt_fingerprint,
            prompt_bytes = prompt.user.len(),
            "asking reasoning service"
        );

        let mut attempts = 0u32;
        let outcome = tokio::time::timeout(
            self.timeout,
            retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
                attempts += 1;
                self.service.generate(&prompt)
            }),
        )
        .await;

        let text = match outcome {
            Ok(Ok(text)) if !text.trim().is_empty() => text.trim().to_owned(),
            Ok(Ok(_)) => return Err(unavailable(request_id, "service returned an empty answer")),
            Ok(Err(err)) => return Err(unavailable(request_id, &err.to_string())),
            Err(_) => {
                return Err(unavailable(
                    request_id,
                    &format!("timed out after {}s", self.timeout.as_secs_f64()),
                ))
            }
        };

        tracing::info!(%request_id, attempts, answer_chars = text.chars().count(), "answer received");
        Ok(Answer {
            request_id,
            restaurant: context.restaurant.clone(),
            question: question.to_owned(),
            text,
            prompt_fingerprint,
            attempts,
            generated_at: Utc::now(),
        })
    }
}

fn unavailable(request_id: Uuid, reason: &str) -> AgentError {
    tracing::warn!(%request_id, reason, "agent unavailable");
    AgentError::Unavailable {
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
