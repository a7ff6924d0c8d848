// src/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Platforms we harvest from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Mastodon,
    Reddit,
    Bluesky,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Mastodon => "mastodon",
            Source::Reddit => "reddit",
            Source::Bluesky => "bluesky",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Source {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mastodon" => Ok(Source::Mastodon),
            "reddit" => Ok(Source::Reddit),
            "bluesky" => Ok(Source::Bluesky),
            other => Err(anyhow::anyhow!("unknown source: {other}")),
        }
    }
}

/// One raw item as returned by a content source, before matching/scoring.
///
/// `position` is the source-native ordering key normalized to u64:
/// numeric status id for Mastodon, unix seconds for Reddit and Bluesky.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedItem {
    pub native_id: String,
    pub author: Option<String>,
    pub raw_content: String,
    /// Source-native timestamp string, kept at source precision.
    pub created_at: String,
    pub position: u64,
}

/// A matched, scored post as persisted to the document store.
///
/// `matched_keywords` is non-empty by construction: unmatched items are
/// discarded before a `HarvestedPost` is ever built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestedPost {
    pub id: String,
    pub source: Source,
    pub author: String,
    pub content: String,
    pub created_at: String,
    pub sentiment_score: f64,
    pub matched_keywords: Vec<String>,
}

/// Per-stream pointer into a content source's sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    pub stream_key: String,
    pub position: u64,
    pub updated_at: DateTime<Utc>,
}
