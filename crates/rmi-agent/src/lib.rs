//! Grounded question answering over a restaurant's metrics context.
//!
//! [`AgentRunner`] turns a question and a [`rmi_metrics::ContextObject`] into
//! a deterministic [`Prompt`], sends it to a [`ReasoningService`] with bounded
//! retries under an overall timeout, and returns an [`Answer`].
//! [`ChatCompletionsClient`] is the HTTP implementation of the service.

mod client;
mod error;
mod prompt;
mod retry;
mod runner;
mod service;

pub use client::ChatCompletionsClient;
pub use error::{AgentError, ServiceError};
pub use prompt::{Prompt, SYSTEM_INSTRUCTIONS};
pub use runner::{AgentRunner, Answer};
pub use service::ReasoningService;
