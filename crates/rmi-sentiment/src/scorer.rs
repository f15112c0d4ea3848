//! Lexicon scorer for restaurant review text.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::LexiconError;
use crate::lexicon::{DEFAULT_LEXICON, NEGATORS};

/// Lowest score any scorer may return.
pub const SCORE_MIN: f64 = -1.0;
/// Highest score any scorer may return.
pub const SCORE_MAX: f64 = 1.0;

/// Number of following tokens a negator reaches.
const NEGATION_WINDOW: u8 = 3;

/// A deterministic text scorer.
///
/// Implementations must return a value in `[SCORE_MIN, SCORE_MAX]` where
/// higher means more positive, and must return the same value for the same
/// text on every call.
pub trait SentimentScorer: Send + Sync {
    fn score(&self, text: &str) -> f64;
}

/// Word-weight scorer with simple negation handling.
#[derive(Debug, Clone)]
pub struct LexiconScorer {
    weights: HashMap<String, f64>,
}

impl Default for LexiconScorer {
    fn default() -> Self {
        let weights = DEFAULT_LEXICON
            .iter()
            .map(|&(word, weight)| (word.to_owned(), weight))
            .collect();
        Self { weights }
    }
}

impl LexiconScorer {
    /// Built-in lexicon extended with overrides parsed from a YAML mapping of
    /// `word: weight`. Override words replace built-in weights.
    ///
    /// # Errors
    ///
    /// - [`LexiconError::Yaml`] for malformed YAML.
    /// - [`LexiconError::WeightOutOfRange`] for weights outside `[-1.0, 1.0]`.
    /// - [`LexiconError::DuplicateWord`] when two keys normalize to the same
    ///   word, e.g. `Great` and `great`.
    pub fn with_overrides_yaml(yaml: &str) -> Result<Self, LexiconError> {
        let overrides: BTreeMap<String, f64> = serde_yaml::from_str(yaml)?;
        let mut normalized: BTreeMap<String, (String, f64)> = BTreeMap::new();
        for (word, weight) in overrides {
            if !(SCORE_MIN..=SCORE_MAX).contains(&weight) {
                return Err(LexiconError::WeightOutOfRange { word, weight });
            }
            let token = normalize_token(&word);
            if let Some((first, _)) = normalized.get(&token) {
                return Err(LexiconError::DuplicateWord {
                    word: token,
                    first: first.clone(),
                    second: word,
                });
            }
            normalized.insert(token, (word, weight));
        }

        let mut scorer = Self::default();
        for (token, (_, weight)) in normalized {
            scorer.weights.insert(token, weight);
        }
        tracing::debug!(words = scorer.weights.len(), "lexicon loaded with overrides");
        Ok(scorer)
    }

    /// Like [`LexiconScorer::with_overrides_yaml`], reading the YAML from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LexiconError::Io`] if the file cannot be read, plus the errors
    /// of [`LexiconScorer::with_overrides_yaml`].
    pub fn from_path(path: &Path) -> Result<Self, LexiconError> {
        let raw = std::fs::read_to_string(path).map_err(|source| LexiconError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_overrides_yaml(&raw)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl SentimentScorer for LexiconScorer {
    /// Sums matching word weights, flipping the sign of a hit that follows a
    /// negator within a short window, and clamps to `[-1.0, 1.0]`.
    fn score(&self, text: &str) -> f64 {
        let mut score = 0.0_f64;
        let mut negation_left = 0_u8;
        for raw in text.split_whitespace() {
            let token = normalize_token(raw);
            if token.is_empty() {
                continue;
            }
            if NEGATORS.contains(&token.as_str()) {
                negation_left = NEGATION_WINDOW;
                continue;
            }
            if let Some(&weight) = self.weights.get(&token) {
                if negation_left > 0 {
                    score -= weight;
                    negation_left = 0;
                } else {
                    score += weight;
                }
                continue;
            }
            negation_left = negation_left.saturating_sub(1);
        }
        score.clamp(SCORE_MIN, SCORE_MAX)
    }
}

/// Score a text string with the built-in restaurant lexicon.
#[must_use]
pub fn lexicon_score(text: &str) -> f64 {
    LexiconScorer::default().score(text)
}

fn normalize_token(raw: &str) -> String {
    raw.replace('\u{2019}', "'")
        .trim_matches(|c: char| !c.is_alphabetic() && c != '\'')
        .trim_matches('\'')
        .to_lowercase()
}
