use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can pass a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let log_level = or_default("RMI_LOG_LEVEL", "info");
    let agent_base_url = or_default("RMI_AGENT_BASE_URL", "https://api.openai.com/v1");
    let agent_api_key = optional("RMI_AGENT_API_KEY");
    let agent_model = or_default("RMI_AGENT_MODEL", "gpt-4o-mini");

    let agent_timeout_secs = parse_u64("RMI_AGENT_TIMEOUT_SECS", "60")?;
    if agent_timeout_secs == 0 {
        return Err(invalid(
            "RMI_AGENT_TIMEOUT_SECS",
            "must be at least 1".to_string(),
        ));
    }
    let agent_max_retries = parse_u32("RMI_AGENT_MAX_RETRIES", "2")?;
    let agent_retry_backoff_base_ms = parse_u64("RMI_AGENT_RETRY_BACKOFF_BASE_MS", "1000")?;

    let context_max_bytes = parse_usize("RMI_CONTEXT_MAX_BYTES", "6000")?;
    let context_max_competitors = parse_usize("RMI_CONTEXT_MAX_COMPETITORS", "5")?;
    let context_max_menu_items = parse_usize("RMI_CONTEXT_MAX_MENU_ITEMS", "10")?;
    let context_review_samples = parse_usize("RMI_CONTEXT_REVIEW_SAMPLES", "3")?;

    let price_tier_bounds = parse_tier_bounds(&or_default("RMI_PRICE_TIER_BOUNDS", "15,30,50"))
        .map_err(|reason| invalid("RMI_PRICE_TIER_BOUNDS", reason))?;

    let lexicon_path = optional("RMI_LEXICON_PATH").map(PathBuf::from);

    Ok(AppConfig {
        log_level,
        agent_base_url,
        agent_api_key,
        agent_model,
        agent_timeout_secs,
        agent_max_retries,
        agent_retry_backoff_base_ms,
        context_max_bytes,
        context_max_competitors,
        context_max_menu_items,
        context_review_samples,
        price_tier_bounds,
        lexicon_path,
    })
}

/// Parse three comma-separated, strictly ascending, non-negative price bounds.
fn parse_tier_bounds(raw: &str) -> Result<[f64; 3], String> {
    let values = raw
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|e| format!("'{}': {e}", part.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let bounds: [f64; 3] = values
        .try_into()
        .map_err(|v: Vec<f64>| format!("expected 3 bounds, got {}", v.len()))?;

    if bounds.iter().any(|b| !b.is_finite() || *b < 0.0) {
        return Err("bounds must be finite and non-negative".to_string());
    }
    if !(bounds[0] < bounds[1] && bounds[1] < bounds[2]) {
        return Err("bounds must be strictly ascending".to_string());
    }
    Ok(bounds)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
