use std::time::Duration;

use thiserror::Error;

/// Failures raised by a [`crate::ReasoningService`] implementation.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Network or TLS failure, or a non-2xx status surfaced by `reqwest`.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP 429. `retry_after` carries the server's `Retry-After` hint.
    #[error("rate limited by reasoning service")]
    RateLimited { retry_after: Option<Duration> },

    /// The service answered with an error body.
    #[error("reasoning service error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The response body was not a usable completion.
    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Errors returned by [`crate::AgentRunner::run`].
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("question is empty")]
    EmptyQuestion,

    /// The reasoning service could not produce an answer for this question.
    #[error("agent unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("failed to encode grounding context: {0}")]
    Prompt(#[from] serde_json::Error),
}
