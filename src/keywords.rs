// src/keywords.rs
//! Keyword gate: which of the tracked keywords/phrases occur in a post.
//!
//! Substring matching by default; `whole_word` switches to word-boundary
//! matching so "trump" stops matching "trumpism". Harvest-time tagging and
//! query-time filters must use the same mode, otherwise documents tagged
//! under one mode silently vanish from queries filtered under the other.

use regex::Regex;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    keywords: Vec<String>,
    lowered: Vec<String>,
    patterns: Option<Vec<Regex>>,
}

impl KeywordMatcher {
    /// Build a substring matcher from the configured keyword list.
    /// Blank entries are dropped; order is preserved, duplicates removed.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = BTreeSet::new();
        let mut kept = Vec::new();
        for kw in keywords {
            let kw: String = kw.into();
            let t = kw.trim();
            if t.is_empty() {
                continue;
            }
            if seen.insert(t.to_ascii_lowercase()) {
                kept.push(t.to_string());
            }
        }
        let lowered = kept.iter().map(|k| k.to_lowercase()).collect();
        Self {
            keywords: kept,
            lowered,
            patterns: None,
        }
    }

    /// Switch to word-boundary matching.
    pub fn with_whole_word(mut self, on: bool) -> Self {
        self.patterns = if on {
            Some(
                self.keywords
                    .iter()
                    .map(|k| {
                        let p = format!(r"(?i)\b{}\b", regex::escape(k));
                        Regex::new(&p).expect("escaped keyword pattern")
                    })
                    .collect(),
            )
        } else {
            None
        };
        self
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// True iff any tracked keyword occurs in the text. Total.
    pub fn matches(&self, text: &str) -> bool {
        match &self.patterns {
            Some(pats) => pats.iter().any(|p| p.is_match(text)),
            None => {
                let lower = text.to_lowercase();
                self.lowered.iter().any(|k| lower.contains(k.as_str()))
            }
        }
    }

    /// The subset of tracked keywords found in the text, in configured
    /// casing. Used both for gating and for tagging the stored document.
    pub fn matched_set(&self, text: &str) -> BTreeSet<String> {
        match &self.patterns {
            Some(pats) => self
                .keywords
                .iter()
                .zip(pats)
                .filter(|(_, p)| p.is_match(text))
                .map(|(k, _)| k.clone())
                .collect(),
            None => {
                let lower = text.to_lowercase();
                self.keywords
                    .iter()
                    .zip(&self.lowered)
                    .filter(|(_, lk)| lower.contains(lk.as_str()))
                    .map(|(k, _)| k.clone())
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_match_is_case_insensitive() {
        let m = KeywordMatcher::new(["Trump", "tariff"]);
        assert!(m.matches("TRUMP said something"));
        assert!(m.matches("new TARIFFS announced"));
        assert!(!m.matches("nothing relevant here"));
    }

    #[test]
    fn matched_set_returns_configured_casing() {
        let m = KeywordMatcher::new(["Trump", "tariff"]);
        let set = m.matched_set("trump announced a new tariff");
        assert_eq!(
            set.into_iter().collect::<Vec<_>>(),
            vec!["Trump".to_string(), "tariff".to_string()]
        );
    }

    #[test]
    fn whole_word_mode_rejects_embedded_hits() {
        let sub = KeywordMatcher::new(["trump"]);
        let word = KeywordMatcher::new(["trump"]).with_whole_word(true);
        assert!(sub.matches("the rise of trumpism"));
        assert!(!word.matches("the rise of trumpism"));
        assert!(word.matches("Trump spoke today"));
    }

    #[test]
    fn phrases_match_across_spaces() {
        let m = KeywordMatcher::new(["Donald Trump"]).with_whole_word(true);
        assert!(m.matches("donald trump arrived"));
        assert!(!m.matches("donald trumpet arrived"));
    }

    #[test]
    fn empty_inputs_never_panic() {
        let m = KeywordMatcher::new(Vec::<String>::new());
        assert!(m.is_empty());
        assert!(!m.matches(""));
        assert!(m.matched_set("").is_empty());

        let m = KeywordMatcher::new(["", "  ", "tariff"]);
        assert!(!m.matches(""));
        assert!(m.matches("a tariff"));
    }

    #[test]
    fn duplicate_keywords_collapse() {
        let m = KeywordMatcher::new(["tariff", "Tariff", "tariff"]);
        assert_eq!(m.matched_set("tariff tariff").len(), 1);
    }
}
