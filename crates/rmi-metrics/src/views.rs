//! Per-dimension projections of a [`MetricsBundle`] for the presentation layer.
//!
//! Every function here takes the bundle by shared reference and only copies
//! values out of it.

use std::str::FromStr;

use serde::Serialize;

use crate::bundle::{
    CompetitorEntry, DeliveryStats, MetricValue, MetricsBundle, PriceStats, SentimentSummary,
};
use crate::error::MetricsError;

/// One analytic facet of a restaurant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Overview,
    Competitors,
    Sentiment,
    Delivery,
    Price,
    Menu,
}

impl Dimension {
    pub const ALL: [Dimension; 6] = [
        Dimension::Overview,
        Dimension::Competitors,
        Dimension::Sentiment,
        Dimension::Delivery,
        Dimension::Price,
        Dimension::Menu,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::Overview => "overview",
            Dimension::Competitors => "competitors",
            Dimension::Sentiment => "sentiment",
            Dimension::Delivery => "delivery",
            Dimension::Price => "price",
            Dimension::Menu => "menu",
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "overview" => Ok(Dimension::Overview),
            "competitors" | "competitor" => Ok(Dimension::Competitors),
            "sentiment" => Ok(Dimension::Sentiment),
            "delivery" => Ok(Dimension::Delivery),
            "price" | "pricing" => Ok(Dimension::Price),
            "menu" | "menu_popularity" => Ok(Dimension::Menu),
            other => Err(format!(
                "unknown dimension '{other}' (expected one of: overview, competitors, sentiment, delivery, price, menu)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: f64,
}

/// A chart-ready labelled series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub points: Vec<SeriesPoint>,
}

impl Series {
    #[allow(clippy::cast_precision_loss)]
    fn from_counts(name: &str, counts: impl IntoIterator<Item = (String, usize)>) -> Self {
        Self {
            name: name.to_string(),
            points: counts
                .into_iter()
                .map(|(label, count)| SeriesPoint {
                    label,
                    value: count as f64,
                })
                .collect(),
        }
    }
}

/// A summary paired with the series a chart would draw from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Charted<T> {
    pub summary: T,
    pub series: Series,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "dimension", rename_all = "snake_case")]
pub enum PresentationData {
    Overview {
        restaurant: String,
        city: String,
        cuisine: String,
        avg_rating: f64,
        review_count: usize,
        ratings: Series,
    },
    Competitors {
        restaurant: String,
        city: String,
        cuisine: String,
        rank: usize,
        segment_size: usize,
        entries: Vec<CompetitorEntry>,
        ratings: Series,
    },
    Sentiment {
        restaurant: String,
        data: MetricValue<Charted<SentimentSummary>>,
    },
    Delivery {
        restaurant: String,
        data: MetricValue<Charted<DeliveryStats>>,
    },
    Price {
        restaurant: String,
        data: MetricValue<Charted<PriceStats>>,
    },
    Menu {
        restaurant: String,
        data: MetricValue<Series>,
    },
}

impl PresentationData {
    #[must_use]
    pub fn dimension(&self) -> Dimension {
        match self {
            PresentationData::Overview { .. } => Dimension::Overview,
            PresentationData::Competitors { .. } => Dimension::Competitors,
            PresentationData::Sentiment { .. } => Dimension::Sentiment,
            PresentationData::Delivery { .. } => Dimension::Delivery,
            PresentationData::Price { .. } => Dimension::Price,
            PresentationData::Menu { .. } => Dimension::Menu,
        }
    }
}

/// Projects one dimension of one restaurant out of the bundle.
///
/// # Errors
///
/// Returns [`MetricsError::UnknownRestaurant`] if `restaurant` is not in the bundle.
pub fn view(
    dimension: Dimension,
    restaurant: &str,
    bundle: &MetricsBundle,
) -> Result<PresentationData, MetricsError> {
    let metrics = bundle.restaurant(restaurant)?;
    let profile = &metrics.profile;
    let name = profile.name.clone();

    let data = match dimension {
        Dimension::Overview => PresentationData::Overview {
            restaurant: name,
            city: profile.city.clone(),
            cuisine: profile.cuisine.clone(),
            avg_rating: profile.avg_rating,
            review_count: profile.review_count,
            ratings: Series::from_counts(
                "reviews by star rating",
                profile
                    .rating_distribution
                    .iter()
                    .map(|b| (format!("{} star", b.stars), b.count)),
            ),
        },
        Dimension::Competitors => {
            let entries = bundle
                .ranking_for(profile)
                .map(|r| r.entries.clone())
                .unwrap_or_default();
            let ratings = Series {
                name: "average rating".to_string(),
                points: entries
                    .iter()
                    .map(|e| SeriesPoint {
                        label: e.name.clone(),
                        value: e.avg_rating,
                    })
                    .collect(),
            };
            PresentationData::Competitors {
                restaurant: name,
                city: profile.city.clone(),
                cuisine: profile.cuisine.clone(),
                rank: metrics.rank,
                segment_size: entries.len(),
                entries,
                ratings,
            }
        }
        Dimension::Sentiment => PresentationData::Sentiment {
            restaurant: name,
            data: metrics.sentiment.map(|s| Charted {
                summary: s.clone(),
                series: Series::from_counts(
                    "reviews by sentiment",
                    [
                        ("positive".to_string(), s.positive),
                        ("neutral".to_string(), s.neutral),
                        ("negative".to_string(), s.negative),
                    ],
                ),
            }),
        },
        Dimension::Delivery => PresentationData::Delivery {
            restaurant: name,
            data: metrics.delivery.map(|d| Charted {
                summary: d.clone(),
                series: Series::from_counts(
                    "orders by delivery time (minutes)",
                    d.distribution.iter().map(|b| (b.label.clone(), b.count)),
                ),
            }),
        },
        Dimension::Price => PresentationData::Price {
            restaurant: name,
            data: metrics.price.map(|p| Charted {
                summary: p.clone(),
                series: Series::from_counts(
                    "orders by price tier",
                    p.tiers.iter().map(|t| (t.tier.to_string(), t.count)),
                ),
            }),
        },
        Dimension::Menu => PresentationData::Menu {
            restaurant: name,
            data: metrics.menu.map(|items| {
                Series::from_counts(
                    "mentions per menu item",
                    items.iter().map(|m| (m.item.clone(), m.count)),
                )
            }),
        },
    };
    Ok(data)
}

/// Display names of restaurants matching the optional city and cuisine
/// filters, compared case-insensitively. `None` matches everything.
#[must_use]
pub fn filter_restaurants(
    bundle: &MetricsBundle,
    city: Option<&str>,
    cuisine: Option<&str>,
) -> Vec<String> {
    let matches = |filter: Option<&str>, value: &str| {
        filter.is_none_or(|f| f.trim().to_lowercase() == value.to_lowercase())
    };
    bundle
        .restaurants()
        .filter(|m| matches(city, &m.profile.city) && matches(cuisine, &m.profile.cuisine))
        .map(|m| m.profile.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_parses_aliases() {
        assert_eq!("Overview".parse::<Dimension>().unwrap(), Dimension::Overview);
        assert_eq!("menu-popularity".parse::<Dimension>().unwrap(), Dimension::Menu);
        assert_eq!("pricing".parse::<Dimension>().unwrap(), Dimension::Price);
        assert!("weather".parse::<Dimension>().is_err());
    }

    #[test]
    fn dimension_display_round_trips_through_from_str() {
        for dimension in Dimension::ALL {
            assert_eq!(dimension.to_string().parse::<Dimension>().unwrap(), dimension);
        }
    }

    #[test]
    fn rendered_view_reports_its_dimension() {
        let csv = "name,city,cuisine,rating,review_text,delivery_time,price,menu_items\n\
                   Bistro A,Austin,Thai,4,Tasty,30,20,Curry\n";
        let dataset = crate::load_bytes(csv.as_bytes()).unwrap();
        let bundle = crate::MetricsEngine::default().compute(&dataset);
        for dimension in Dimension::ALL {
            let data = view(dimension, "bistro a", &bundle).unwrap();
            assert_eq!(data.dimension(), dimension);
        }
    }
}
