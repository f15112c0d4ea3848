//! Built-in word weights for restaurant reviews.

/// Keys are lowercase single words. Values in `(0.0, 1.0]` are positive,
/// in `[-1.0, 0.0)` are negative.
pub(crate) const DEFAULT_LEXICON: &[(&str, f64)] = &[
    // Positive signals
    ("amazing", 0.5),
    ("awesome", 0.5),
    ("best", 0.5),
    ("delicious", 0.5),
    ("excellent", 0.5),
    ("fantastic", 0.5),
    ("love", 0.5),
    ("loved", 0.5),
    ("perfect", 0.5),
    ("great", 0.4),
    ("tasty", 0.4),
    ("fresh", 0.4),
    ("friendly", 0.4),
    ("recommend", 0.4),
    ("yummy", 0.4),
    ("flavorful", 0.4),
    ("good", 0.3),
    ("nice", 0.3),
    ("quick", 0.3),
    ("fast", 0.3),
    ("hot", 0.2),
    ("generous", 0.3),
    ("affordable", 0.3),
    ("clean", 0.3),
    ("polite", 0.3),
    ("enjoyed", 0.4),
    ("worth", 0.3),
    // Negative signals
    ("awful", -0.6),
    ("disgusting", -0.7),
    ("horrible", -0.6),
    ("terrible", -0.6),
    ("worst", -0.6),
    ("inedible", -0.7),
    ("rude", -0.5),
    ("bad", -0.4),
    ("cold", -0.3),
    ("soggy", -0.4),
    ("stale", -0.4),
    ("bland", -0.3),
    ("slow", -0.3),
    ("late", -0.4),
    ("overpriced", -0.4),
    ("expensive", -0.2),
    ("dirty", -0.5),
    ("wrong", -0.3),
    ("missing", -0.3),
    ("burnt", -0.4),
    ("greasy", -0.3),
    ("disappointing", -0.5),
    ("disappointed", -0.5),
    ("refund", -0.4),
    ("sick", -0.7),
];

/// Words that flip the polarity of the word that follows them.
pub(crate) const NEGATORS: &[&str] = &[
    "not", "no", "never", "isn't", "wasn't", "aren't", "weren't", "don't", "didn't",
    "doesn't", "hardly",
];
