//! The immutable metrics bundle and its per-dimension value types.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::MetricsError;
use crate::normalize::restaurant_key;

/// A dimension value or the explicit marker that no record qualified.
///
/// `NoData` is never interchangeable with a zero-valued `Data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum MetricValue<T> {
    Data(T),
    NoData,
}

impl<T> MetricValue<T> {
    pub(crate) fn from_option(value: Option<T>) -> Self {
        value.map_or(MetricValue::NoData, MetricValue::Data)
    }

    #[must_use]
    pub fn as_data(&self) -> Option<&T> {
        match self {
            MetricValue::Data(value) => Some(value),
            MetricValue::NoData => None,
        }
    }

    #[must_use]
    pub fn is_no_data(&self) -> bool {
        matches!(self, MetricValue::NoData)
    }

    pub fn map<U>(&self, f: impl FnOnce(&T) -> U) -> MetricValue<U> {
        match self {
            MetricValue::Data(value) => MetricValue::Data(f(value)),
            MetricValue::NoData => MetricValue::NoData,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingBucket {
    pub stars: u8,
    pub count: usize,
}

/// Per-restaurant profile. `review_count` is always at least 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestaurantProfile {
    pub name: String,
    pub city: String,
    pub cuisine: String,
    pub avg_rating: f64,
    /// Buckets for 1 through 5 stars, always five entries.
    pub rating_distribution: Vec<RatingBucket>,
    pub review_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentSummary {
    /// Mean score in `[-1.0, 1.0]`.
    pub mean: f64,
    /// Population variance of the scores.
    pub variance: f64,
    pub scored_reviews: usize,
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionBucket {
    pub label: String,
    pub count: usize,
}

/// Delivery time distribution in minutes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryStats {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub p90: f64,
    pub max: f64,
    pub distribution: Vec<DistributionBucket>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PriceTier {
    #[serde(rename = "$")]
    Budget,
    #[serde(rename = "$$")]
    Moderate,
    #[serde(rename = "$$$")]
    Upscale,
    #[serde(rename = "$$$$")]
    Premium,
}

impl PriceTier {
    pub const ALL: [PriceTier; 4] = [
        PriceTier::Budget,
        PriceTier::Moderate,
        PriceTier::Upscale,
        PriceTier::Premium,
    ];

    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            PriceTier::Budget => "$",
            PriceTier::Moderate => "$$",
            PriceTier::Upscale => "$$$",
            PriceTier::Premium => "$$$$",
        }
    }
}

impl std::fmt::Display for PriceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierCount {
    pub tier: PriceTier,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceStats {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub median: f64,
    pub max: f64,
    /// Tier holding the most orders; ties go to the cheaper tier.
    pub dominant_tier: PriceTier,
    /// One entry per tier, cheapest first.
    pub tiers: Vec<TierCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuItemCount {
    pub item: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetitorEntry {
    /// 1-based position within the segment.
    pub rank: usize,
    pub name: String,
    pub avg_rating: f64,
    pub review_count: usize,
}

/// All restaurants sharing one (city, cuisine) segment, best first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketRanking {
    pub city: String,
    pub cuisine: String,
    pub entries: Vec<CompetitorEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestaurantMetrics {
    pub profile: RestaurantProfile,
    /// This restaurant's rank within its (city, cuisine) segment.
    pub rank: usize,
    pub sentiment: MetricValue<SentimentSummary>,
    pub delivery: MetricValue<DeliveryStats>,
    pub price: MetricValue<PriceStats>,
    /// Sorted by count descending, then item name case-insensitively.
    pub menu: MetricValue<Vec<MenuItemCount>>,
    /// First non-blank review texts in input order, capped by the engine.
    pub review_sample: Vec<String>,
}

/// Every derived metric for one loaded dataset.
///
/// Built by [`crate::MetricsEngine::compute`]; never mutated afterwards.
/// Ordered maps keep serialization byte-stable across computations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsBundle {
    pub(crate) fingerprint: String,
    pub(crate) restaurants: BTreeMap<String, RestaurantMetrics>,
    /// Sorted by (city, cuisine).
    pub(crate) rankings: Vec<MarketRanking>,
    pub(crate) price_tiers: MetricValue<Vec<TierCount>>,
}

impl MetricsBundle {
    /// Fingerprint of the dataset this bundle was computed from.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.restaurants.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.restaurants.is_empty()
    }

    /// Looks up a restaurant by name, ignoring case and extra whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::UnknownRestaurant`] if no such restaurant exists.
    pub fn restaurant(&self, name: &str) -> Result<&RestaurantMetrics, MetricsError> {
        self.restaurants
            .get(&restaurant_key(name))
            .ok_or_else(|| MetricsError::UnknownRestaurant(name.to_string()))
    }

    pub fn restaurants(&self) -> impl Iterator<Item = &RestaurantMetrics> {
        self.restaurants.values()
    }

    #[must_use]
    pub fn rankings(&self) -> &[MarketRanking] {
        &self.rankings
    }

    /// Ranking of the (city, cuisine) segment the profile belongs to.
    #[must_use]
    pub fn ranking_for(&self, profile: &RestaurantProfile) -> Option<&MarketRanking> {
        self.rankings
            .binary_search_by(|r| {
                (r.city.as_str(), r.cuisine.as_str())
                    .cmp(&(profile.city.as_str(), profile.cuisine.as_str()))
            })
            .ok()
            .map(|idx| &self.rankings[idx])
    }

    /// Dataset-wide price-tier distribution.
    #[must_use]
    pub fn price_tiers(&self) -> &MetricValue<Vec<TierCount>> {
        &self.price_tiers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_data_serializes_distinctly_from_zero() {
        let none: MetricValue<f64> = MetricValue::NoData;
        let zero = MetricValue::Data(0.0);
        assert_eq!(serde_json::to_string(&none).unwrap(), r#"{"status":"no_data"}"#);
        assert_eq!(
            serde_json::to_string(&zero).unwrap(),
            r#"{"status":"data","value":0.0}"#
        );
    }

    #[test]
    fn metric_value_map_preserves_no_data() {
        let none: MetricValue<u32> = MetricValue::NoData;
        assert!(none.map(|v| v + 1).is_no_data());
        assert_eq!(MetricValue::Data(1).map(|v| v + 1), MetricValue::Data(2));
    }

    #[test]
    fn price_tier_serializes_as_symbol() {
        assert_eq!(serde_json::to_string(&PriceTier::Upscale).unwrap(), r#""$$$""#);
        assert_eq!(PriceTier::Premium.to_string(), "$$$$");
    }
}
