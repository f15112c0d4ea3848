//! Bounded grounding context for the reasoning agent.
//!
//! The context carries aggregates only, plus a small capped sample of review
//! snippets. Its compact JSON encoding never exceeds [`ContextBudget::max_bytes`].

use std::collections::BTreeSet;

use serde::Serialize;

use crate::bundle::{
    CompetitorEntry, MenuItemCount, MetricValue, MetricsBundle, PriceTier, RestaurantProfile,
    SentimentSummary, TierCount,
};
use crate::error::MetricsError;
use crate::views::Dimension;

const ELLIPSIS: char = '\u{2026}';

/// Keywords that mark a question as being about a dimension.
///
/// Each keyword matches whole words of the lowercased question. A trailing
/// `*` turns a word into a prefix, and a space-separated keyword must match
/// consecutive words.
const FOCUS_KEYWORDS: &[(Dimension, &[&str])] = &[
    (
        Dimension::Overview,
        &["rating*", "rated", "overall", "overview", "summary", "star", "stars", "perform*"],
    ),
    (
        Dimension::Competitors,
        &["compet*", "rival*", "compar*", "versus", "vs", "rank*", "market*", "other restaurants"],
    ),
    (
        Dimension::Sentiment,
        &[
            "sentiment*", "review*", "customer*", "feel*", "complain*", "happy", "unhappy",
            "satisf*", "dissatisf*", "opinion*",
        ],
    ),
    (
        Dimension::Delivery,
        &["deliver*", "late", "wait*", "slow*", "fast", "faster", "minute*", "eta"],
    ),
    (
        Dimension::Price,
        &[
            "price*", "pricing", "cost*", "expensive", "cheap*", "afford*", "value for money",
            "tier*",
        ],
    ),
    (
        Dimension::Menu,
        &["menu*", "dish*", "item*", "popular*", "best seller*", "bestseller*", "best selling"],
    ),
];

/// Limits applied while building a [`ContextObject`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextBudget {
    /// Upper bound on the compact JSON size of the context, in bytes.
    pub max_bytes: usize,
    pub max_competitors: usize,
    pub max_menu_items: usize,
    pub max_review_samples: usize,
    /// Characters kept from each review snippet.
    pub max_review_chars: usize,
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self {
            max_bytes: 6000,
            max_competitors: 5,
            max_menu_items: 10,
            max_review_samples: 3,
            max_review_chars: 280,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetitorContext {
    pub city: String,
    pub cuisine: String,
    /// The selected restaurant's own rank, even when it falls outside `top`.
    pub rank: usize,
    pub segment_size: usize,
    /// Best-ranked restaurants of the segment, in rank order.
    pub top: Vec<CompetitorEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliverySummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub p90: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub dominant_tier: PriceTier,
    pub tiers: Vec<TierCount>,
}

/// Structured excerpt of the bundle handed to the agent for one question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextObject {
    pub restaurant: String,
    pub question: String,
    /// Dimensions the question appears to be about, in dimension order.
    pub focus: Vec<Dimension>,
    pub profile: RestaurantProfile,
    pub competitors: CompetitorContext,
    pub sentiment: MetricValue<SentimentSummary>,
    pub delivery: MetricValue<DeliverySummary>,
    pub price: MetricValue<PriceSummary>,
    pub top_menu_items: MetricValue<Vec<MenuItemCount>>,
    pub review_samples: Vec<String>,
    /// Set when anything was cut to fit the byte budget.
    pub truncated: bool,
}

impl ContextObject {
    /// Size of the compact JSON encoding in bytes.
    #[must_use]
    pub fn serialized_len(&self) -> usize {
        serde_json::to_vec(self).map_or(usize::MAX, |bytes| bytes.len())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    budget: ContextBudget,
}

impl ContextBuilder {
    #[must_use]
    pub fn new(budget: ContextBudget) -> Self {
        Self { budget }
    }

    #[must_use]
    pub fn budget(&self) -> &ContextBudget {
        &self.budget
    }

    /// Selects the restaurant's slice of the bundle and fits it to the budget.
    ///
    /// Over-budget contexts are cut in a fixed order: review snippets from the
    /// end, then menu items from the least popular, then competitors from the
    /// lowest rank, then the tail of the question.
    ///
    /// # Errors
    ///
    /// - [`MetricsError::UnknownRestaurant`] if `restaurant` is not in the bundle.
    /// - [`MetricsError::ContextBudgetTooSmall`] if even the fully cut context
    ///   exceeds the budget.
    pub fn build(
        &self,
        restaurant: &str,
        question: &str,
        bundle: &MetricsBundle,
    ) -> Result<ContextObject, MetricsError> {
        let metrics = bundle.restaurant(restaurant)?;
        let profile = &metrics.profile;
        let budget = &self.budget;

        let (segment_size, top) = bundle
            .ranking_for(profile)
            .map(|r| {
                let top: Vec<CompetitorEntry> =
                    r.entries.iter().take(budget.max_competitors).cloned().collect();
                (r.entries.len(), top)
            })
            .unwrap_or_default();

        let mut context = ContextObject {
            restaurant: profile.name.clone(),
            question: question.trim().to_string(),
            focus: detect_focus(question),
            profile: profile.clone(),
            competitors: CompetitorContext {
                city: profile.city.clone(),
                cuisine: profile.cuisine.clone(),
                rank: metrics.rank,
                segment_size,
                top,
            },
            sentiment: metrics.sentiment.clone(),
            delivery: metrics.delivery.map(|d| DeliverySummary {
                count: d.count,
                mean: d.mean,
                median: d.median,
                p90: d.p90,
            }),
            price: metrics.price.map(|p| PriceSummary {
                count: p.count,
                mean: p.mean,
                median: p.median,
                dominant_tier: p.dominant_tier,
                tiers: p.tiers.clone(),
            }),
            top_menu_items: metrics
                .menu
                .map(|items| items.iter().take(budget.max_menu_items).cloned().collect()),
            review_samples: metrics
                .review_sample
                .iter()
                .take(budget.max_review_samples)
                .map(|text| snippet(text, budget.max_review_chars))
                .collect(),
            truncated: false,
        };

        fit_to_budget(&mut context, budget.max_bytes)?;
        tracing::debug!(
            restaurant = %context.restaurant,
            bytes = context.serialized_len(),
            truncated = context.truncated,
            "grounding context built"
        );
        Ok(context)
    }
}

fn fit_to_budget(context: &mut ContextObject, max_bytes: usize) -> Result<(), MetricsError> {
    loop {
        let len = context.serialized_len();
        if len <= max_bytes {
            return Ok(());
        }
        context.truncated = true;

        if context.review_samples.pop().is_some() {
            continue;
        }
        if let MetricValue::Data(items) = &mut context.top_menu_items {
            if items.pop().is_some() {
                continue;
            }
        }
        if context.competitors.top.pop().is_some() {
            continue;
        }
        if !context.question.is_empty() {
            let chars = context.question.chars().count();
            let keep = chars.saturating_sub((len - max_bytes).max(1));
            context.question = context.question.chars().take(keep).collect();
            continue;
        }
        return Err(MetricsError::ContextBudgetTooSmall {
            budget: max_bytes,
            required: len,
        });
    }
}

fn detect_focus(question: &str) -> Vec<Dimension> {
    let lower = question.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    FOCUS_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| keyword_matches(&words, k)))
        .map(|(dimension, _)| *dimension)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn keyword_matches(words: &[&str], keyword: &str) -> bool {
    let parts: Vec<&str> = keyword.split(' ').collect();
    words.windows(parts.len()).any(|window| {
        window.iter().zip(&parts).all(|(word, part)| match part.strip_suffix('*') {
            Some(stem) => word.starts_with(stem),
            None => word == part,
        })
    })
}

fn snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push(ELLIPSIS);
    cut
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
