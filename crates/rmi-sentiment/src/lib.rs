//! Deterministic review sentiment scoring.
//!
//! The metrics engine only depends on the [`SentimentScorer`] trait; the
//! bundled [`LexiconScorer`] is the default implementation and can be
//! extended with a YAML override file.

pub mod error;
mod lexicon;
pub mod scorer;

pub use error::LexiconError;
pub use scorer::{lexicon_score, LexiconScorer, SentimentScorer, SCORE_MAX, SCORE_MIN};
