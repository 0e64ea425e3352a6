//! Fuzzy identity between item names.
//!
//! Identifiers are tokenized on a fixed set of separators, lowercased and
//! stripped of stopwords (noise words that appear in nearly every name), then
//! compared with Jaccard similarity over the resulting token sets:
//!
//! ```text
//! tokens("hello_world_example")  → {hello, world}
//! tokens("hello-world.html")     → {hello, world}
//! similarity                     → |{hello, world}| / |{hello, world}| = 1.0
//! ```

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Characters that separate tokens inside an identifier.
pub const SEPARATORS: [char; 4] = ['-', '_', ' ', ':'];
/// Tokens that carry no identity (they appear in nearly every name).
pub const DEFAULT_STOPWORDS: [&str; 3] = ["go", "by", "example"];
/// Minimum similarity for two identifiers to be treated as the same item.
pub const DEFAULT_THRESHOLD: f64 = 0.7;

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^0-9a-z_]+").unwrap());

/// Converts a source name into a storage-safe identifier: trimmed, lowercased,
/// and every run of non-word characters collapsed to `_`.
///
/// ```
/// use bindery_book::naming::sanitize;
/// assert_eq!(sanitize("  Hello World!"), "hello_world_");
/// assert_eq!(sanitize("hello-world"), "hello_world");
/// ```
pub fn sanitize(name: &str) -> String {
    NON_WORD.replace_all(&name.trim().to_lowercase(), "_").into_owned()
}

/// Tokenizes identifiers and scores their overlap.
#[derive(Clone, Debug)]
pub struct Matcher {
    stopwords: BTreeSet<String>,
    threshold: f64,
}
impl Default for Matcher {
    fn default() -> Self {
        Self::new(DEFAULT_STOPWORDS, DEFAULT_THRESHOLD)
    }
}
impl Matcher {
    pub fn new(stopwords: impl IntoIterator<Item = impl AsRef<str>>, threshold: f64) -> Self {
        let stopwords = stopwords.into_iter().map(|w| w.as_ref().trim().to_lowercase()).collect();
        Self { stopwords, threshold }
    }

    /// Splits an identifier (optionally carrying an `.html` extension) into its
    /// meaningful, lowercased tokens.
    pub fn tokens(&self, identifier: &str) -> BTreeSet<String> {
        identifier
            .strip_suffix(".html")
            .unwrap_or(identifier)
            .split(SEPARATORS)
            .map(|token| token.trim().to_lowercase())
            .filter(|token| !token.is_empty() && !self.stopwords.contains(token))
            .collect()
    }

    /// Jaccard similarity of the two identifiers' token sets, in `[0, 1]`.
    ///
    /// Defined as `0.0` when either side has no tokens, so empty names never
    /// match anything (including each other).
    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        let (a, b) = (self.tokens(a), self.tokens(b));
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        let shared = a.intersection(&b).count();
        let union = a.len() + b.len() - shared;
        shared as f64 / union as f64
    }

    /// Returns the similarity when it meets the acceptance threshold.
    pub fn matches(&self, a: &str, b: &str) -> Option<f64> {
        let score = self.similarity(a, b);
        (score >= self.threshold).then_some(score)
    }
}
