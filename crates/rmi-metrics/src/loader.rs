//! CSV ingestion into a validated [`Dataset`].

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use rmi_core::ReviewRecord;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::LoadError;
use crate::normalize::{
    check_record, collapse_whitespace, normalize_label, parse_minutes, parse_price, parse_rating,
    restaurant_key, split_menu_items,
};

/// Columns every upload must carry, in reporting order.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "name",
    "city",
    "cuisine",
    "rating",
    "review_text",
    "delivery_time",
    "price",
    "menu_items",
];

/// Distinct values offered to the presentation layer for selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionOptions {
    /// Restaurant display names, deduplicated case-insensitively.
    pub names: Vec<String>,
    pub cities: Vec<String>,
    pub cuisines: Vec<String>,
}

/// A validated, non-empty set of review records.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<ReviewRecord>,
    dropped_rows: usize,
    fingerprint: String,
    options: SelectionOptions,
}

impl Dataset {
    /// Builds a dataset from records constructed in memory. The fingerprint
    /// is derived from the record contents.
    ///
    /// Records are held to the same rules as CSV rows: a finite rating within
    /// range, non-blank name, city and cuisine, and finite non-negative
    /// delivery time and price. Records that break them are dropped and added
    /// to `dropped_rows`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::EmptyDataset`] if no record survives.
    pub fn from_records(
        records: Vec<ReviewRecord>,
        mut dropped_rows: usize,
    ) -> Result<Self, LoadError> {
        let records: Vec<ReviewRecord> = records
            .into_iter()
            .enumerate()
            .filter(|(index, record)| match check_record(record) {
                Ok(()) => true,
                Err(reason) => {
                    dropped_rows += 1;
                    tracing::debug!(index, %reason, "dropping record");
                    false
                }
            })
            .map(|(_, record)| record)
            .collect();
        let fingerprint = records_fingerprint(&records);
        Self::assemble(records, dropped_rows, fingerprint)
    }

    fn assemble(
        records: Vec<ReviewRecord>,
        dropped_rows: usize,
        fingerprint: String,
    ) -> Result<Self, LoadError> {
        if records.is_empty() {
            return Err(LoadError::EmptyDataset { dropped_rows });
        }
        let options = selection_options(&records);
        Ok(Self {
            records,
            dropped_rows,
            fingerprint,
            options,
        })
    }

    #[must_use]
    pub fn records(&self) -> &[ReviewRecord] {
        &self.records
    }

    /// Rows removed during cleaning because a cell failed coercion.
    #[must_use]
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    /// Hex SHA-256 identifying this upload.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    #[must_use]
    pub fn options(&self) -> &SelectionOptions {
        &self.options
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First `limit` records in input order.
    #[must_use]
    pub fn preview(&self, limit: usize) -> &[ReviewRecord] {
        &self.records[..limit.min(self.records.len())]
    }
}

/// Loads a dataset from a CSV file on disk.
///
/// # Errors
///
/// Returns [`LoadError::Io`] if the file cannot be read, otherwise the errors
/// of [`load_bytes`].
pub fn load_path(path: &Path) -> Result<Dataset, LoadError> {
    let raw = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_bytes(&raw)
}

/// Loads a dataset from any reader.
///
/// # Errors
///
/// See [`load_bytes`]. Read failures surface as [`LoadError::Io`].
pub fn load_reader<R: Read>(mut reader: R) -> Result<Dataset, LoadError> {
    let mut raw = Vec::new();
    reader
        .read_to_end(&mut raw)
        .map_err(|source| LoadError::Io {
            path: "<reader>".into(),
            source,
        })?;
    load_bytes(&raw)
}

/// Parses raw CSV bytes into a validated [`Dataset`].
///
/// Rows whose cells fail coercion are dropped and counted rather than
/// aborting the load.
///
/// # Errors
///
/// - [`LoadError::Schema`] if any of [`REQUIRED_COLUMNS`] is missing.
/// - [`LoadError::EmptyDataset`] if no row survives cleaning.
/// - [`LoadError::Csv`] if the header row cannot be read.
pub fn load_bytes(raw: &[u8]) -> Result<Dataset, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(raw);

    let columns = ColumnIndex::resolve(reader.headers()?)?;

    let mut records = Vec::new();
    let mut dropped_rows = 0usize;
    for (idx, row) in reader.records().enumerate() {
        let line = idx + 2;
        let parsed = row
            .map_err(|e| e.to_string())
            .and_then(|row| columns.parse_row(&row));
        match parsed {
            Ok(record) => records.push(record),
            Err(reason) => {
                dropped_rows += 1;
                tracing::debug!(line, %reason, "dropping row");
            }
        }
    }

    if dropped_rows > 0 {
        tracing::warn!(
            dropped_rows,
            kept_rows = records.len(),
            "rows dropped during cleaning"
        );
    }

    let fingerprint = format!("{:x}", Sha256::digest(raw));
    let dataset = Dataset::assemble(records, dropped_rows, fingerprint)?;
    tracing::info!(
        rows = dataset.len(),
        restaurants = dataset.options.names.len(),
        fingerprint = %dataset.fingerprint,
        "dataset loaded"
    );
    Ok(dataset)
}

/// Positions of the required columns within the header row.
struct ColumnIndex {
    name: usize,
    city: usize,
    cuisine: usize,
    rating: usize,
    review_text: usize,
    delivery_time: usize,
    price: usize,
    menu_items: usize,
}

impl ColumnIndex {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, LoadError> {
        let normalized: Vec<String> = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_lowercase())
            .collect();
        let position = |column: &str| normalized.iter().position(|h| h == column);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|column| position(**column).is_none())
            .map(|column| (*column).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::Schema { missing });
        }

        let at = |column: &str| position(column).unwrap_or_default();
        Ok(Self {
            name: at("name"),
            city: at("city"),
            cuisine: at("cuisine"),
            rating: at("rating"),
            review_text: at("review_text"),
            delivery_time: at("delivery_time"),
            price: at("price"),
            menu_items: at("menu_items"),
        })
    }

    fn parse_row(&self, row: &csv::StringRecord) -> Result<ReviewRecord, String> {
        let cell = |idx: usize| row.get(idx).unwrap_or("");
        let required = |idx: usize, column: &str| -> Result<String, String> {
            let value = collapse_whitespace(cell(idx));
            if value.is_empty() {
                Err(format!("{column} is blank"))
            } else {
                Ok(value)
            }
        };

        Ok(ReviewRecord {
            name: required(self.name, "name")?,
            city: normalize_label(&required(self.city, "city")?),
            cuisine: normalize_label(&required(self.cuisine, "cuisine")?),
            rating: parse_rating(cell(self.rating))?,
            review_text: cell(self.review_text).trim().to_string(),
            delivery_time_min: parse_minutes(cell(self.delivery_time))?,
            price: parse_price(cell(self.price))?,
            menu_items: split_menu_items(cell(self.menu_items)),
        })
    }
}

fn selection_options(records: &[ReviewRecord]) -> SelectionOptions {
    let mut names: BTreeMap<String, String> = BTreeMap::new();
    let mut cities: BTreeMap<String, String> = BTreeMap::new();
    let mut cuisines: BTreeMap<String, String> = BTreeMap::new();
    for record in records {
        names
            .entry(restaurant_key(&record.name))
            .or_insert_with(|| record.name.clone());
        cities
            .entry(record.city.to_lowercase())
            .or_insert_with(|| record.city.clone());
        cuisines
            .entry(record.cuisine.to_lowercase())
            .or_insert_with(|| record.cuisine.clone());
    }
    SelectionOptions {
        names: names.into_values().collect(),
        cities: cities.into_values().collect(),
        cuisines: cuisines.into_values().collect(),
    }
}

fn records_fingerprint(records: &[ReviewRecord]) -> String {
    const SEP: [u8; 1] = [0x1f];
    let mut hasher = Sha256::new();
    for record in records {
        for text in [&record.name, &record.city, &record.cuisine, &record.review_text] {
            hasher.update(text.as_bytes());
            hasher.update(SEP);
        }
        hasher.update(record.rating.to_bits().to_le_bytes());
        for value in [record.delivery_time_min, record.price] {
            match value {
                Some(v) => hasher.update(v.to_bits().to_le_bytes()),
                None => hasher.update(SEP),
            }
        }
        for item in &record.menu_items {
            hasher.update(item.as_bytes());
            hasher.update(SEP);
        }
        hasher.update([0x1e]);
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
#[path = "loader_test.rs"]
mod tests;
