// src/sources/reddit.rs
//! Subreddit "new" listing source. The listing API has no usable "since"
//! parameter, so the strictly-greater cursor bound is applied client-side
//! on `created_utc`, which is also the native position (unix seconds).

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use serde::Deserialize;

use crate::sources::{ascending, newer_than, ContentSource};
use crate::types::FetchedItem;

const DEFAULT_BASE_URL: &str = "https://www.reddit.com";

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Submission,
}

#[derive(Debug, Deserialize)]
struct Submission {
    id: String,
    author: Option<String>,
    title: Option<String>,
    selftext: Option<String>,
    created_utc: Option<f64>,
}

pub struct RedditSource {
    subreddit: String,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        base_url: String,
        user_agent: String,
        client: reqwest::Client,
    },
}

impl RedditSource {
    pub fn from_fixture_str(subreddit: &str, s: &str) -> Self {
        Self {
            subreddit: subreddit.to_string(),
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_url(subreddit: &str, user_agent: &str) -> Result<Self> {
        Self::from_base_url(DEFAULT_BASE_URL, subreddit, user_agent)
    }

    pub fn from_base_url(base_url: &str, subreddit: &str, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("building reddit http client")?;
        Ok(Self {
            subreddit: subreddit.to_string(),
            mode: Mode::Http {
                base_url: base_url.trim_end_matches('/').to_string(),
                user_agent: user_agent.to_string(),
                client,
            },
        })
    }

    pub fn parse_listing(s: &str) -> Result<Vec<FetchedItem>> {
        let listing: Listing = serde_json::from_str(s).context("parsing reddit listing json")?;
        let mut out = Vec::with_capacity(listing.data.children.len());
        for child in listing.data.children {
            let sub = child.data;
            let created_utc = sub.created_utc.unwrap_or(0.0).max(0.0);
            let position = created_utc as u64;
            out.push(FetchedItem {
                native_id: sub.id,
                author: sub.author,
                raw_content: format!(
                    "{} {}",
                    sub.title.as_deref().unwrap_or_default(),
                    sub.selftext.as_deref().unwrap_or_default()
                )
                .trim()
                .to_string(),
                created_at: format_utc(position),
                position,
            });
        }
        Ok(out)
    }

    async fn fetch_page(&self, limit: usize) -> Result<Vec<FetchedItem>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_listing(s),
            Mode::Http {
                base_url,
                user_agent,
                client,
            } => {
                let url = format!("{base_url}/r/{}/new.json", self.subreddit);
                let body = client
                    .get(&url)
                    .header(reqwest::header::USER_AGENT, user_agent)
                    .query(&[("limit", limit.to_string()), ("raw_json", "1".into())])
                    .send()
                    .await
                    .context("reddit listing get()")?
                    .error_for_status()
                    .context("reddit listing http status")?
                    .text()
                    .await
                    .context("reddit listing .text()")?;
                Self::parse_listing(&body)
            }
        }
    }
}

fn format_utc(unix: u64) -> String {
    Utc.timestamp_opt(unix as i64, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

#[async_trait::async_trait]
impl ContentSource for RedditSource {
    fn name(&self) -> &'static str {
        "reddit"
    }

    async fn fetch_since(
        &self,
        position: Option<u64>,
        limit: usize,
    ) -> Result<Vec<FetchedItem>> {
        match position {
            None => {
                let items = ascending(self.fetch_page(1).await?);
                Ok(items.into_iter().last().into_iter().collect())
            }
            Some(pos) => {
                let items = self.fetch_page(limit).await?;
                let mut items = ascending(newer_than(items, Some(pos)));
                items.truncate(limit);
                Ok(items)
            }
        }
    }
}
