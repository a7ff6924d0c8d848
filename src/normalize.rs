// src/normalize.rs
//! Content normalization: markup stripping and entity decoding applied to
//! every raw post body before keyword matching and scoring.

use once_cell::sync::OnceCell;
use regex::Regex;

const MAX_CONTENT_CHARS: usize = 5_000;

/// Strip markup, decode HTML entities, collapse whitespace.
///
/// Deterministic and total: malformed markup degrades to best-effort
/// stripped text, never an error. Tags are stripped before entities are
/// decoded, so a literal `&lt;p&gt;` in a post body survives as text.
pub fn normalize_content(raw: &str) -> String {
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    let stripped = re_tags.replace_all(raw, " ");

    let mut out = html_escape::decode_html_entities(stripped.as_ref()).to_string();

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    if out.chars().count() > MAX_CONTENT_CHARS {
        out = out.chars().take(MAX_CONTENT_CHARS).collect();
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_decodes_entities() {
        let s = "<p>Trump announced a new tariff today</p>";
        assert_eq!(normalize_content(s), "Trump announced a new tariff today");
    }

    #[test]
    fn collapses_whitespace_and_nbsp() {
        let s = "  Hello&nbsp;&nbsp; <b>world</b>  ";
        assert_eq!(normalize_content(s), "Hello world");
    }

    #[test]
    fn literal_escaped_tags_survive_as_text() {
        // strip-then-decode: the decoded `<p>` must not be re-stripped
        let s = "wrote &lt;p&gt; in a post";
        assert_eq!(normalize_content(s), "wrote <p> in a post");
    }

    #[test]
    fn malformed_markup_never_panics() {
        for s in ["<p", "<<<>>", "</", "&#xZZ;", ""] {
            let _ = normalize_content(s);
        }
        assert_eq!(normalize_content("<p"), "<p");
    }

    #[test]
    fn long_content_is_capped() {
        let s = "a".repeat(20_000);
        assert_eq!(normalize_content(&s).chars().count(), MAX_CONTENT_CHARS);
    }
}
