use std::path::PathBuf;

use crate::ConfigError;

/// Runtime configuration assembled from `RMI_*` environment variables.
#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub agent_base_url: String,
    pub agent_api_key: Option<String>,
    pub agent_model: String,
    pub agent_timeout_secs: u64,
    pub agent_max_retries: u32,
    pub agent_retry_backoff_base_ms: u64,
    pub context_max_bytes: usize,
    pub context_max_competitors: usize,
    pub context_max_menu_items: usize,
    pub context_review_samples: usize,
    /// Upper bounds of the `$`, `$$` and `$$$` price tiers, ascending.
    pub price_tier_bounds: [f64; 3],
    pub lexicon_path: Option<PathBuf>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("agent_base_url", &self.agent_base_url)
            .field(
                "agent_api_key",
                &self.agent_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("agent_model", &self.agent_model)
            .field("agent_timeout_secs", &self.agent_timeout_secs)
            .field("agent_max_retries", &self.agent_max_retries)
            .field(
                "agent_retry_backoff_base_ms",
                &self.agent_retry_backoff_base_ms,
            )
            .field("context_max_bytes", &self.context_max_bytes)
            .field("context_max_competitors", &self.context_max_competitors)
            .field("context_max_menu_items", &self.context_max_menu_items)
            .field("context_review_samples", &self.context_review_samples)
            .field("price_tier_bounds", &self.price_tier_bounds)
            .field("lexicon_path", &self.lexicon_path)
            .finish()
    }
}

impl AppConfig {
    /// API key for the reasoning service, required by anything that calls it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] naming `RMI_AGENT_API_KEY` when
    /// no non-blank key is configured.
    pub fn require_agent_api_key(&self) -> Result<&str, ConfigError> {
        self.agent_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("RMI_AGENT_API_KEY".to_string()))
    }
}
