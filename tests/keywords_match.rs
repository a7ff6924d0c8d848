// tests/keywords_match.rs
// End-to-end gate behavior: normalize then match, the way the harvest
// cycle applies them.

use au_sentiment_harvester::keywords::KeywordMatcher;
use au_sentiment_harvester::normalize::normalize_content;

#[test]
fn markup_post_matches_both_keywords() {
    let matcher = KeywordMatcher::new(["trump", "tariff"]);
    let normalized = normalize_content("<p>Trump announced a new tariff today</p>");

    assert_eq!(normalized, "Trump announced a new tariff today");
    assert!(matcher.matches(&normalized));
    assert_eq!(
        matcher.matched_set(&normalized).into_iter().collect::<Vec<_>>(),
        vec!["tariff".to_string(), "trump".to_string()]
    );
}

#[test]
fn phrase_keywords_survive_normalization() {
    let matcher = KeywordMatcher::new(["Donald Trump"]);
    let normalized = normalize_content("<span>Donald</span> <span>Trump</span> spoke");
    assert!(matcher.matches(&normalized));
}

#[test]
fn unmatched_content_yields_empty_set() {
    let matcher = KeywordMatcher::new(["trump", "tariff"]);
    let normalized = normalize_content("<p>Nice weather in Sydney today</p>");
    assert!(!matcher.matches(&normalized));
    assert!(matcher.matched_set(&normalized).is_empty());
}

#[test]
fn whole_word_mode_changes_the_verdict() {
    let text = "an essay on trumpism and tariffs";
    let substring = KeywordMatcher::new(["trump"]);
    let whole = KeywordMatcher::new(["trump"]).with_whole_word(true);

    assert!(substring.matches(text));
    assert!(!whole.matches(text));
}
