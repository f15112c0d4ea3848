//! Command handlers. Each prints one JSON document to stdout.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use rmi_agent::{AgentRunner, ChatCompletionsClient};
use rmi_core::AppConfig;
use rmi_metrics::{
    filter_restaurants, load_path, view, BundleCache, ContextBudget, ContextBuilder, Dataset,
    Dimension, MetricsBundle, MetricsEngine, PriceTierBounds,
};
use rmi_sentiment::{LexiconScorer, SentimentScorer};
use serde::Serialize;

/// A loaded dataset and the bundle computed from it.
pub(crate) struct Session {
    dataset: Dataset,
    bundle: Arc<MetricsBundle>,
}

impl Session {
    /// Loads `file` and computes its metrics with the configured scorer and tiers.
    ///
    /// # Errors
    ///
    /// Returns an error if the lexicon override or the dataset cannot be
    /// loaded, or the configured price tiers are not ascending.
    pub(crate) fn open(config: &AppConfig, file: &Path) -> anyhow::Result<Self> {
        let scorer: Arc<dyn SentimentScorer> = match &config.lexicon_path {
            Some(path) => Arc::new(LexiconScorer::from_path(path)?),
            None => Arc::new(LexiconScorer::default()),
        };
        let tiers = PriceTierBounds::new(config.price_tier_bounds).ok_or_else(|| {
            anyhow::anyhow!(
                "RMI_PRICE_TIER_BOUNDS must be three ascending non-negative numbers, got {:?}",
                config.price_tier_bounds
            )
        })?;
        let engine = MetricsEngine::new(scorer).with_price_tiers(tiers);

        let dataset =
            load_path(file).with_context(|| format!("failed to load {}", file.display()))?;
        let mut cache = BundleCache::new();
        let bundle = cache.get_or_compute(&dataset, &engine);

        Ok(Self { dataset, bundle })
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn context_builder(config: &AppConfig) -> ContextBuilder {
    ContextBuilder::new(ContextBudget {
        max_bytes: config.context_max_bytes,
        max_competitors: config.context_max_competitors,
        max_menu_items: config.context_max_menu_items,
        max_review_samples: config.context_review_samples,
        ..ContextBudget::default()
    })
}

/// Prints the selectable restaurants, cities and cuisines.
///
/// # Errors
///
/// Returns an error if the output cannot be serialized.
pub(crate) fn run_options(
    session: &Session,
    city: Option<&str>,
    cuisine: Option<&str>,
) -> anyhow::Result<()> {
    let restaurants = filter_restaurants(&session.bundle, city, cuisine);
    if restaurants.is_empty() {
        tracing::warn!(?city, ?cuisine, "no restaurants match the filters");
    }
    let options = session.dataset.options();
    print_json(&serde_json::json!({
        "fingerprint": session.dataset.fingerprint(),
        "rows": session.dataset.len(),
        "dropped_rows": session.dataset.dropped_rows(),
        "restaurants": restaurants,
        "cities": options.cities,
        "cuisines": options.cuisines,
    }))
}

/// Prints one dimension for `restaurant`, or every dimension when none is given.
///
/// # Errors
///
/// Returns an error if the restaurant is unknown.
pub(crate) fn run_view(
    session: &Session,
    restaurant: &str,
    dimension: Option<Dimension>,
) -> anyhow::Result<()> {
    let dimensions = match dimension {
        Some(dimension) => vec![dimension],
        None => Dimension::ALL.to_vec(),
    };
    let views = dimensions
        .into_iter()
        .map(|d| view(d, restaurant, &session.bundle))
        .collect::<Result<Vec<_>, _>>()?;
    for data in &views {
        tracing::debug!(restaurant, dimension = %data.dimension(), "view rendered");
    }
    match views.as_slice() {
        [single] => print_json(single),
        _ => print_json(&views),
    }
}

/// Answers `question` about `restaurant` through the configured agent.
///
/// With `context_only`, prints the grounding context and makes no request.
///
/// # Errors
///
/// Returns an error if the restaurant is unknown, the context does not fit
/// the budget, no API key is configured, or the agent is unavailable.
pub(crate) async fn run_ask(
    session: &Session,
    config: &AppConfig,
    restaurant: &str,
    question: &str,
    context_only: bool,
) -> anyhow::Result<()> {
    let builder = context_builder(config);
    let context = builder.build(restaurant, question, &session.bundle)?;
    if context.truncated {
        tracing::info!(
            bytes = context.serialized_len(),
            budget = builder.budget().max_bytes,
            "grounding context truncated to fit budget"
        );
    }
    if context_only {
        return print_json(&context);
    }

    let api_key = config.require_agent_api_key()?;
    let client = ChatCompletionsClient::with_base_url(
        api_key,
        &config.agent_model,
        config.agent_timeout_secs,
        &config.agent_base_url,
    )?;
    let runner = AgentRunner::new(Arc::new(client))
        .with_timeout(Duration::from_secs(config.agent_timeout_secs))
        .with_retry_policy(config.agent_max_retries, config.agent_retry_backoff_base_ms);

    let answer = runner.run(question, &context).await?;
    print_json(&answer)
}

/// Prints the first `limit` cleaned rows.
///
/// # Errors
///
/// Returns an error if the output cannot be serialized.
pub(crate) fn run_preview(session: &Session, limit: usize) -> anyhow::Result<()> {
    print_json(&serde_json::json!({
        "rows": session.dataset.len(),
        "dropped_rows": session.dataset.dropped_rows(),
        "preview": session.dataset.preview(limit),
    }))
}
