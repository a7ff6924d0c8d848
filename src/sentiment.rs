// src/sentiment.rs
//! Sentiment scoring contract and the built-in lexicon scorer.
//!
//! The harvest cycle treats scoring as a black box that either returns a
//! value in [-1, 1] or fails. Anything else — an error, NaN, Inf, a value
//! outside the valid range — is mapped to the unscorable sentinel by
//! [`guard_score`], never stored as 0.0 and never allowed to crash a cycle.

use anyhow::Result;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Reserved out-of-range score meaning "could not be scored".
pub const UNSCORABLE_SENTINEL: f64 = 2.0;

pub trait SentimentScorer: Send + Sync {
    /// Score normalized text. Contract: Ok value lies in [-1.0, 1.0].
    fn score(&self, text: &str) -> Result<f64>;
}

/// Map a scorer outcome to a storable score: valid values pass through,
/// everything else becomes `sentinel`.
pub fn guard_score(result: Result<f64>, sentinel: f64) -> f64 {
    match result {
        Ok(v) if v.is_finite() && (-1.0..=1.0).contains(&v) => v,
        Ok(v) => {
            tracing::warn!(value = v, "scorer returned invalid value, using sentinel");
            sentinel
        }
        Err(e) => {
            tracing::warn!(error = ?e, "scorer failed, using sentinel");
            sentinel
        }
    }
}

static LEXICON: Lazy<HashMap<String, i32>> = Lazy::new(|| {
    let raw = include_str!("sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, i32>>(raw).expect("valid sentiment lexicon")
});

/// Lexicon-based reference scorer.
///
/// Sums per-word valences (inverted when a negator appears within the
/// previous 1..=3 tokens) and squashes the raw sum into [-1, 1] with the
/// usual `x / sqrt(x^2 + 15)` normalization, rounded to 4 decimals.
#[derive(Debug, Clone, Default)]
pub struct LexiconScorer;

impl LexiconScorer {
    pub fn new() -> Self {
        Self
    }

    #[inline]
    fn word_valence(&self, w: &str) -> i32 {
        *LEXICON.get(w).unwrap_or(&0)
    }
}

impl SentimentScorer for LexiconScorer {
    fn score(&self, text: &str) -> Result<f64> {
        let tokens: Vec<String> = tokenize(text).collect();
        let mut raw: i32 = 0;

        for i in 0..tokens.len() {
            let base = self.word_valence(tokens[i].as_str());
            if base == 0 {
                continue;
            }
            let negated = (1..=3).any(|k| i >= k && is_negator(tokens[i - k].as_str()));
            raw += if negated { -base } else { base };
        }

        let x = f64::from(raw);
        let compound = x / (x * x + 15.0).sqrt();
        Ok((compound * 10_000.0).round() / 10_000.0)
    }
}

/// Alphanumeric tokens, lower-cased.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_ascii_lowercase())
}

// Contractions lose their apostrophe in tokenization, so "isn't" arrives
// as "isn" + "t".
fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not" | "no" | "never" | "isn" | "wasn" | "aren" | "won" | "cant" | "cannot" | "without"
    )
}
