use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("failed to read lexicon file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("lexicon YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("weight for '{word}' must be within [-1.0, 1.0], got {weight}")]
    WeightOutOfRange { word: String, weight: f64 },

    #[error("lexicon words '{first}' and '{second}' both normalize to '{word}'")]
    DuplicateWord {
        word: String,
        first: String,
        second: String,
    },
}
