//! HTTP client for OpenAI-compatible chat-completions endpoints.
//!
//! Sends the prompt as a system and a user message at temperature 0 and maps
//! every non-answer outcome onto a [`ServiceError`] variant.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::prompt::Prompt;
use crate::service::ReasoningService;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f64,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Reasoning service backed by `POST {base_url}/chat/completions`.
///
/// Use [`ChatCompletionsClient::new`] for the default endpoint or
/// [`ChatCompletionsClient::with_base_url`] for a compatible server or a mock.
pub struct ChatCompletionsClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: Url,
}

impl std::fmt::Debug for ChatCompletionsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsClient")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &"[redacted]")
            .finish_non_exhaustive()
    }
}

impl ChatCompletionsClient {
    /// # Errors
    ///
    /// Returns [`ServiceError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, ServiceError> {
        Self::with_base_url(api_key, model, timeout_secs, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`ServiceError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`ServiceError::InvalidBaseUrl`] if `base_url` does not
    /// parse.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("rmi/0.1 (restaurant-insights)")
            .build()?;

        // Exactly one trailing slash so `join` appends instead of replacing
        // the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&normalised)
            .and_then(|base| base.join("chat/completions"))
            .map_err(|e| ServiceError::InvalidBaseUrl {
                url: base_url.to_owned(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            endpoint,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String, ServiceError> {
        let request = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(ServiceError::RateLimited { retry_after });
        }
        if status.is_server_error() {
            return match response.error_for_status() {
                Err(e) => Err(ServiceError::Http(e)),
                Ok(_) => Err(ServiceError::Malformed(format!("unexpected status {status}"))),
            };
        }

        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(api_error(status, &body));
        }
        parse_completion(&body)
    }
}

/// Maps a non-2xx body onto [`ServiceError::Api`], falling back to the raw text.
fn api_error(status: StatusCode, body: &[u8]) -> ServiceError {
    let message = serde_json::from_slice::<ErrorEnvelope>(body).map_or_else(
        |_| String::from_utf8_lossy(body).trim().to_owned(),
        |envelope| envelope.error.message,
    );
    ServiceError::Api {
        status: status.as_u16(),
        message,
    }
}

fn parse_completion(body: &[u8]) -> Result<String, ServiceError> {
    if let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(body) {
        return Err(ServiceError::Api {
            status: StatusCode::OK.as_u16(),
            message: envelope.error.message,
        });
    }

    let parsed: ChatResponse =
        serde_json::from_slice(body).map_err(|e| ServiceError::Malformed(e.to_string()))?;
    let text = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_owned())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(ServiceError::Malformed(
            "completion has no message content".to_owned(),
        ));
    }
    Ok(text)
}

#[async_trait]
impl ReasoningService for ChatCompletionsClient {
    async fn generate(&self, prompt: &Prompt) -> Result<String, ServiceError> {
        tracing::debug!(model = %self.model, endpoint = %self.endpoint, "requesting completion");
        self.complete(prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_joined_with_single_slash() {
        let client =
            ChatCompletionsClient::with_base_url("k", "m", 5, "http://localhost:8080/v1/").unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/chat/completions");

        let client =
            ChatCompletionsClient::with_base_url("k", "m", 5, "http://localhost:8080").unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8080/chat/completions");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = ChatCompletionsClient::with_base_url("k", "m", 5, "not a url").unwrap_err();
        assert!(matches!(err, ServiceError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let client = ChatCompletionsClient::new("sk-secret", "gpt-4o-mini", 5).unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("gpt-4o-mini"));
    }

    #[test]
    fn completion_text_is_trimmed() {
        let body = br#"{"choices":[{"message":{"role":"assistant","content":"  Ratings are up. \n"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "Ratings are up.");
    }

    #[test]
    fn null_content_is_malformed() {
        let body = br#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert!(matches!(parse_completion(body), Err(ServiceError::Malformed(_))));
    }

    #[test]
    fn plain_text_error_body_is_kept() {
        let err = api_error(StatusCode::UNAUTHORIZED, b"invalid key\n");
        match err {
            ServiceError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "invalid key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
