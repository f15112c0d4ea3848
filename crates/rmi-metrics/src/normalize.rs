//! Cell-level coercion helpers used by the loader.
//!
//! Each `parse_*` function returns `Err(reason)` for a value that should drop
//! the row, and `Ok(None)` for an optional cell that is simply blank.

use std::sync::LazyLock;

use regex::Regex;
use rmi_core::{ReviewRecord, RATING_MAX, RATING_MIN};

static MINUTES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+(?:\.\d+)?)(?:\s*[-\u{2013}]\s*(\d+(?:\.\d+)?))?\s*(?:m|mins?|minutes?)?$")
        .expect("valid minutes regex")
});

static MENU_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,;|]").expect("valid menu split regex"));

/// Identity key for a restaurant name: trimmed, inner whitespace collapsed,
/// case-folded. Two rows belong to the same restaurant iff their keys match.
#[must_use]
pub fn restaurant_key(name: &str) -> String {
    collapse_whitespace(name).to_lowercase()
}

pub(crate) fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical spelling for city and cuisine labels: whitespace collapsed and
/// each word capitalised (`"new  YORK"` becomes `"New York"`).
pub(crate) fn normalize_label(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Applies the row rules to a record that did not come through the CSV
/// parser.
pub(crate) fn check_record(record: &ReviewRecord) -> Result<(), String> {
    for (column, value) in [
        ("name", &record.name),
        ("city", &record.city),
        ("cuisine", &record.cuisine),
    ] {
        if value.trim().is_empty() {
            return Err(format!("{column} is blank"));
        }
    }
    check_rating(record.rating)?;
    for (column, value) in [
        ("delivery time", record.delivery_time_min),
        ("price", record.price),
    ] {
        if let Some(value) = value {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{column} {value} is negative or not finite"));
            }
        }
    }
    Ok(())
}

fn check_rating(value: f64) -> Result<f64, String> {
    if !value.is_finite() || !(RATING_MIN..=RATING_MAX).contains(&value) {
        return Err(format!(
            "rating {value} outside [{RATING_MIN}, {RATING_MAX}]"
        ));
    }
    Ok(value)
}

pub(crate) fn parse_rating(raw: &str) -> Result<f64, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("rating is blank".to_string());
    }
    let value = trimmed
        .parse::<f64>()
        .map_err(|_| format!("rating '{trimmed}' is not numeric"))?;
    check_rating(value)
}

/// Delivery time in minutes. Accepts `"30"`, `"30 min"`, `"25.5mins"` and
/// ranges such as `"30-40 minutes"`, which resolve to their midpoint.
pub(crate) fn parse_minutes(raw: &str) -> Result<Option<f64>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let caps = MINUTES_RE
        .captures(trimmed)
        .ok_or_else(|| format!("delivery time '{trimmed}' is not numeric"))?;
    let low = parse_finite(&caps[1])?;
    let value = match caps.get(2) {
        Some(high) => {
            let high = parse_finite(high.as_str())?;
            if high < low {
                return Err(format!("delivery range '{trimmed}' is reversed"));
            }
            (low + high) / 2.0
        }
        None => low,
    };
    Ok(Some(value))
}

/// Order price. Accepts a leading currency symbol and thousands separators.
pub(crate) fn parse_price(raw: &str) -> Result<Option<f64>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let cleaned: String = trimmed
        .trim_start_matches(['$', '\u{20ac}', '\u{a3}'])
        .trim()
        .chars()
        .filter(|c| *c != ',')
        .collect();
    let value = cleaned
        .parse::<f64>()
        .map_err(|_| format!("price '{trimmed}' is not numeric"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("price {value} is negative or not finite"));
    }
    Ok(Some(value))
}

/// Split a menu-items cell into item names, preserving order.
///
/// Tolerates list-literal formatting such as `["Pad Thai", 'Spring Rolls']`.
pub(crate) fn split_menu_items(raw: &str) -> Vec<String> {
    let inner = raw.trim().trim_start_matches('[').trim_end_matches(']');
    MENU_SPLIT_RE
        .split(inner)
        .map(|item| collapse_whitespace(item.trim().trim_matches(['"', '\''])))
        .filter(|item| !item.is_empty())
        .collect()
}

fn parse_finite(raw: &str) -> Result<f64, String> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("'{raw}' is not a finite number"))
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
