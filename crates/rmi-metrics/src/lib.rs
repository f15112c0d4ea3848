//! Metrics engine and grounding layer for restaurant review datasets.
//!
//! [`load_bytes`] validates a CSV upload into a [`Dataset`],
//! [`MetricsEngine::compute`] derives one immutable [`MetricsBundle`] from
//! it, [`view`] projects a single analytic dimension for one restaurant, and
//! [`ContextBuilder::build`] assembles the bounded [`ContextObject`] handed to
//! the reasoning agent. [`BundleCache`] keeps the last bundle keyed by the
//! dataset fingerprint.

pub mod bundle;
pub mod cache;
pub mod context;
pub mod engine;
pub mod error;
pub mod loader;
mod normalize;
mod stats;
pub mod views;

pub use bundle::{
    CompetitorEntry, DeliveryStats, DistributionBucket, MarketRanking, MenuItemCount,
    MetricValue, MetricsBundle, PriceStats, PriceTier, RatingBucket, RestaurantMetrics,
    RestaurantProfile, SentimentSummary, TierCount,
};
pub use cache::BundleCache;
pub use context::{
    CompetitorContext, ContextBudget, ContextBuilder, ContextObject, DeliverySummary,
    PriceSummary,
};
pub use engine::{MetricsEngine, PriceTierBounds};
pub use error::{LoadError, MetricsError};
pub use loader::{load_bytes, load_path, load_reader, Dataset, SelectionOptions, REQUIRED_COLUMNS};
pub use normalize::restaurant_key;
pub use views::{
    filter_restaurants, view, Charted, Dimension, PresentationData, Series, SeriesPoint,
};
