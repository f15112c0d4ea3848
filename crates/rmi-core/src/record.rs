use serde::{Deserialize, Serialize};

/// Lowest rating a review row may carry.
pub const RATING_MIN: f64 = 0.0;
/// Highest rating a review row may carry.
pub const RATING_MAX: f64 = 5.0;

/// One validated review row.
///
/// Produced by the dataset loader after coercion; text fields are already
/// trimmed and city/cuisine are case-normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Restaurant display name as spelled in this row.
    pub name: String,
    pub city: String,
    pub cuisine: String,
    /// Rating in `[RATING_MIN, RATING_MAX]`.
    pub rating: f64,
    /// Free review text. May be empty.
    pub review_text: String,
    /// Delivery time in minutes. `None` when the cell was blank.
    pub delivery_time_min: Option<f64>,
    /// Order price. `None` when the cell was blank.
    pub price: Option<f64>,
    /// Menu items mentioned in the review, in the order they appeared.
    pub menu_items: Vec<String>,
}

impl ReviewRecord {
    /// Whether the review carries any non-whitespace text.
    #[must_use]
    pub fn has_review_text(&self) -> bool {
        !self.review_text.trim().is_empty()
    }
}
