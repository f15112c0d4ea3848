//! Derives the [`MetricsBundle`] from a validated [`Dataset`].

use std::collections::BTreeMap;
use std::sync::Arc;

use rmi_core::ReviewRecord;
use rmi_sentiment::{LexiconScorer, SentimentScorer};

use crate::bundle::{
    CompetitorEntry, DeliveryStats, DistributionBucket, MarketRanking, MenuItemCount,
    MetricValue, MetricsBundle, PriceStats, PriceTier, RatingBucket, RestaurantMetrics,
    RestaurantProfile, SentimentSummary, TierCount,
};
use crate::loader::Dataset;
use crate::normalize::restaurant_key;
use crate::stats::{mean, quantile_sorted, round4, sorted, variance};

/// Scores with an absolute value below this count as neutral.
const NEUTRAL_BAND: f64 = 0.05;

/// Upper edges (exclusive) of the delivery-time buckets, in minutes.
const DELIVERY_EDGES: [f64; 4] = [15.0, 30.0, 45.0, 60.0];
const DELIVERY_LABELS: [&str; 5] = ["<15", "15-30", "30-45", "45-60", "60+"];

const DEFAULT_REVIEW_SAMPLE_CAP: usize = 10;

/// Exclusive upper bounds of the `$`, `$$` and `$$$` tiers. Prices at or
/// above the last bound are `$$$$`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceTierBounds([f64; 3]);

impl Default for PriceTierBounds {
    fn default() -> Self {
        Self([15.0, 30.0, 50.0])
    }
}

impl PriceTierBounds {
    /// Returns `None` unless the bounds are finite, non-negative and strictly
    /// ascending.
    #[must_use]
    pub fn new(bounds: [f64; 3]) -> Option<Self> {
        let valid = bounds.iter().all(|b| b.is_finite() && *b >= 0.0)
            && bounds[0] < bounds[1]
            && bounds[1] < bounds[2];
        valid.then_some(Self(bounds))
    }

    #[must_use]
    pub fn tier_for(&self, price: f64) -> PriceTier {
        let [budget, moderate, upscale] = self.0;
        if price < budget {
            PriceTier::Budget
        } else if price < moderate {
            PriceTier::Moderate
        } else if price < upscale {
            PriceTier::Upscale
        } else {
            PriceTier::Premium
        }
    }
}

/// Computes every per-restaurant aggregate in one pass over the records.
///
/// Computation is deterministic: the same dataset always produces an equal
/// bundle that serializes to identical bytes.
#[derive(Clone)]
pub struct MetricsEngine {
    scorer: Arc<dyn SentimentScorer>,
    tiers: PriceTierBounds,
    review_sample_cap: usize,
}

impl std::fmt::Debug for MetricsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsEngine")
            .field("tiers", &self.tiers)
            .field("review_sample_cap", &self.review_sample_cap)
            .finish_non_exhaustive()
    }
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::new(Arc::new(LexiconScorer::default()))
    }
}

impl MetricsEngine {
    #[must_use]
    pub fn new(scorer: Arc<dyn SentimentScorer>) -> Self {
        Self {
            scorer,
            tiers: PriceTierBounds::default(),
            review_sample_cap: DEFAULT_REVIEW_SAMPLE_CAP,
        }
    }

    #[must_use]
    pub fn with_price_tiers(mut self, tiers: PriceTierBounds) -> Self {
        self.tiers = tiers;
        self
    }

    /// Number of review texts kept per restaurant for grounding samples.
    #[must_use]
    pub fn with_review_sample_cap(mut self, cap: usize) -> Self {
        self.review_sample_cap = cap;
        self
    }

    #[must_use]
    pub fn compute(&self, dataset: &Dataset) -> MetricsBundle {
        let mut groups: BTreeMap<String, Accumulator> = BTreeMap::new();
        for record in dataset.records() {
            groups
                .entry(restaurant_key(&record.name))
                .or_insert_with(|| Accumulator::new(&record.name))
                .push(record, self.scorer.as_ref(), self.review_sample_cap);
        }

        let mut global_tiers = [0usize; 4];
        let mut restaurants: BTreeMap<String, RestaurantMetrics> = groups
            .into_iter()
            .map(|(key, acc)| {
                for &price in &acc.prices {
                    global_tiers[self.tiers.tier_for(price) as usize] += 1;
                }
                (key, acc.finish(&self.tiers))
            })
            .collect();

        let rankings = rank_segments(&mut restaurants);
        let priced: usize = global_tiers.iter().sum();
        let price_tiers = MetricValue::from_option((priced > 0).then(|| tier_counts(global_tiers)));

        tracing::info!(
            restaurants = restaurants.len(),
            segments = rankings.len(),
            fingerprint = dataset.fingerprint(),
            "metrics bundle computed"
        );

        MetricsBundle {
            fingerprint: dataset.fingerprint().to_string(),
            restaurants,
            rankings,
            price_tiers,
        }
    }
}

/// Running state for one restaurant while records stream through.
struct Accumulator {
    display_name: String,
    cities: Vec<String>,
    cuisines: Vec<String>,
    ratings: Vec<f64>,
    sentiment: Vec<f64>,
    delivery: Vec<f64>,
    prices: Vec<f64>,
    /// Case-folded item -> (first-seen spelling, count).
    menu: BTreeMap<String, (String, usize)>,
    review_sample: Vec<String>,
}

impl Accumulator {
    fn new(display_name: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            cities: Vec::new(),
            cuisines: Vec::new(),
            ratings: Vec::new(),
            sentiment: Vec::new(),
            delivery: Vec::new(),
            prices: Vec::new(),
            menu: BTreeMap::new(),
            review_sample: Vec::new(),
        }
    }

    fn push(&mut self, record: &ReviewRecord, scorer: &dyn SentimentScorer, sample_cap: usize) {
        self.cities.push(record.city.clone());
        self.cuisines.push(record.cuisine.clone());
        self.ratings.push(record.rating);
        if record.has_review_text() {
            self.sentiment.push(scorer.score(&record.review_text));
            if self.review_sample.len() < sample_cap {
                self.review_sample.push(record.review_text.clone());
            }
        }
        if let Some(minutes) = record.delivery_time_min {
            self.delivery.push(minutes);
        }
        if let Some(price) = record.price {
            self.prices.push(price);
        }
        for item in &record.menu_items {
            self.menu
                .entry(item.to_lowercase())
                .or_insert_with(|| (item.clone(), 0))
                .1 += 1;
        }
    }

    fn finish(self, tiers: &PriceTierBounds) -> RestaurantMetrics {
        let avg_rating = mean(&self.ratings).map_or(0.0, round4);
        let profile = RestaurantProfile {
            name: self.display_name,
            city: mode_first_seen(&self.cities),
            cuisine: mode_first_seen(&self.cuisines),
            avg_rating,
            rating_distribution: rating_distribution(&self.ratings),
            review_count: self.ratings.len(),
        };

        RestaurantMetrics {
            profile,
            rank: 0,
            sentiment: MetricValue::from_option(sentiment_summary(&self.sentiment)),
            delivery: MetricValue::from_option(delivery_stats(&self.delivery)),
            price: MetricValue::from_option(price_stats(&self.prices, tiers)),
            menu: MetricValue::from_option(menu_popularity(self.menu)),
            review_sample: self.review_sample,
        }
    }
}

/// Most frequent value; ties go to the value seen first.
fn mode_first_seen(values: &[String]) -> String {
    let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for (idx, value) in values.iter().enumerate() {
        counts.entry(value.as_str()).or_insert((0, idx)).0 += 1;
    }
    counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(value, _)| value.to_string())
        .unwrap_or_default()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn rating_distribution(ratings: &[f64]) -> Vec<RatingBucket> {
    let mut counts = [0usize; 5];
    for rating in ratings.iter().filter(|r| r.is_finite()) {
        let stars = rating.round().clamp(1.0, 5.0) as usize;
        counts[stars.saturating_sub(1).min(4)] += 1;
    }
    (1u8..=5)
        .zip(counts)
        .map(|(stars, count)| RatingBucket { stars, count })
        .collect()
}

fn sentiment_summary(scores: &[f64]) -> Option<SentimentSummary> {
    let mean_score = mean(scores)?;
    let variance_score = variance(scores)?;
    let positive = scores.iter().filter(|s| **s >= NEUTRAL_BAND).count();
    let negative = scores.iter().filter(|s| **s <= -NEUTRAL_BAND).count();
    Some(SentimentSummary {
        mean: round4(mean_score),
        variance: round4(variance_score),
        scored_reviews: scores.len(),
        positive,
        neutral: scores.len() - positive - negative,
        negative,
    })
}

fn delivery_stats(minutes: &[f64]) -> Option<DeliveryStats> {
    let ordered = sorted(minutes);
    let q = |p: f64| quantile_sorted(&ordered, p).map(round4);

    let mut buckets = [0usize; 5];
    for value in &ordered {
        let idx = DELIVERY_EDGES
            .iter()
            .position(|edge| value < edge)
            .unwrap_or(DELIVERY_EDGES.len());
        buckets[idx] += 1;
    }

    Some(DeliveryStats {
        count: ordered.len(),
        mean: round4(mean(&ordered)?),
        min: q(0.0)?,
        p25: q(0.25)?,
        median: q(0.5)?,
        p75: q(0.75)?,
        p90: q(0.9)?,
        max: q(1.0)?,
        distribution: DELIVERY_LABELS
            .iter()
            .zip(buckets)
            .map(|(label, count)| DistributionBucket {
                label: (*label).to_string(),
                count,
            })
            .collect(),
    })
}

fn price_stats(prices: &[f64], tiers: &PriceTierBounds) -> Option<PriceStats> {
    let ordered = sorted(prices);
    let mut counts = [0usize; 4];
    for &price in &ordered {
        counts[tiers.tier_for(price) as usize] += 1;
    }
    let tier_counts = tier_counts(counts);
    let dominant_tier = tier_counts
        .iter()
        .rev()
        .max_by_key(|t| t.count)
        .map_or(PriceTier::Budget, |t| t.tier);

    Some(PriceStats {
        count: ordered.len(),
        mean: round4(mean(&ordered)?),
        min: round4(quantile_sorted(&ordered, 0.0)?),
        median: round4(quantile_sorted(&ordered, 0.5)?),
        max: round4(quantile_sorted(&ordered, 1.0)?),
        dominant_tier,
        tiers: tier_counts,
    })
}

fn tier_counts(counts: [usize; 4]) -> Vec<TierCount> {
    PriceTier::ALL
        .into_iter()
        .zip(counts)
        .map(|(tier, count)| TierCount { tier, count })
        .collect()
}

fn menu_popularity(menu: BTreeMap<String, (String, usize)>) -> Option<Vec<MenuItemCount>> {
    if menu.is_empty() {
        return None;
    }
    // BTreeMap iteration is already key-ascending; a stable sort by count keeps that order for ties.
    let mut items: Vec<MenuItemCount> = menu
        .into_values()
        .map(|(item, count)| MenuItemCount { item, count })
        .collect();
    items.sort_by(|a, b| b.count.cmp(&a.count));
    Some(items)
}

/// Groups restaurants by (city, cuisine), orders each group and writes each
/// restaurant's rank back into its metrics.
fn rank_segments(restaurants: &mut BTreeMap<String, RestaurantMetrics>) -> Vec<MarketRanking> {
    let mut segments: BTreeMap<(String, String), Vec<&str>> = BTreeMap::new();
    for (key, metrics) in restaurants.iter() {
        segments
            .entry((metrics.profile.city.clone(), metrics.profile.cuisine.clone()))
            .or_default()
            .push(key.as_str());
    }

    let mut ranks: Vec<(String, usize)> = Vec::new();
    let mut rankings = Vec::with_capacity(segments.len());
    for ((city, cuisine), mut keys) in segments {
        keys.sort_by(|a, b| {
            let pa = &restaurants[*a].profile;
            let pb = &restaurants[*b].profile;
            pb.avg_rating
                .total_cmp(&pa.avg_rating)
                .then(pb.review_count.cmp(&pa.review_count))
                .then_with(|| pa.name.cmp(&pb.name))
                .then_with(|| a.cmp(b))
        });
        let entries = keys
            .iter()
            .enumerate()
            .map(|(idx, key)| {
                let profile = &restaurants[*key].profile;
                ranks.push(((*key).to_string(), idx + 1));
                CompetitorEntry {
                    rank: idx + 1,
                    name: profile.name.clone(),
                    avg_rating: profile.avg_rating,
                    review_count: profile.review_count,
                }
            })
            .collect();
        rankings.push(MarketRanking {
            city,
            cuisine,
            entries,
        });
    }

    for (key, rank) in ranks {
        if let Some(metrics) = restaurants.get_mut(&key) {
            metrics.rank = rank;
        }
    }
    rankings
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
