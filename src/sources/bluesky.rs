// src/sources/bluesky.rs
//! Bluesky search source. Authenticates with an app password, pages
//! through `searchPosts` results with a repeated-cursor guard, and uses
//! `createdAt` (unix seconds) as the native position. AT-URIs are unique,
//! so documents key on the native id alone.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use time::{format_description::well_known::Rfc3339, OffsetDateTime, UtcOffset};

use crate::identity::IdentityStrategy;
use crate::sources::{ascending, newer_than, ContentSource};
use crate::types::FetchedItem;

const DEFAULT_BASE_URL: &str = "https://bsky.social";
const MAX_PAGES: usize = 10;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    posts: Option<Vec<Post>>,
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Post {
    uri: String,
    author: Option<Author>,
    record: Option<Record>,
}

#[derive(Debug, Deserialize)]
struct Author {
    handle: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Record {
    text: Option<String>,
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Session {
    access_jwt: String,
}

pub struct BlueskySource {
    query: String,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        base_url: String,
        identifier: String,
        app_password: String,
        client: reqwest::Client,
    },
}

impl BlueskySource {
    pub fn from_fixture_str(query: &str, s: &str) -> Self {
        Self {
            query: query.to_string(),
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_url(query: &str, identifier: &str, app_password: &str) -> Result<Self> {
        Self::from_base_url(DEFAULT_BASE_URL, query, identifier, app_password)
    }

    pub fn from_base_url(
        base_url: &str,
        query: &str,
        identifier: &str,
        app_password: &str,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("building bluesky http client")?;
        Ok(Self {
            query: query.to_string(),
            mode: Mode::Http {
                base_url: base_url.trim_end_matches('/').to_string(),
                identifier: identifier.to_string(),
                app_password: app_password.to_string(),
                client,
            },
        })
    }

    pub fn parse_search(s: &str) -> Result<(Vec<FetchedItem>, Option<String>)> {
        let resp: SearchResponse = serde_json::from_str(s).context("parsing bluesky search json")?;
        let posts = resp.posts.unwrap_or_default();
        let mut out = Vec::with_capacity(posts.len());
        for post in posts {
            let record = post.record.unwrap_or(Record {
                text: None,
                created_at: None,
            });
            let created_at = record.created_at.unwrap_or_default();
            out.push(FetchedItem {
                native_id: post.uri,
                author: post.author.and_then(|a| a.handle),
                raw_content: record.text.unwrap_or_default(),
                position: parse_rfc3339_to_unix(&created_at),
                created_at,
            });
        }
        Ok((out, resp.cursor))
    }

    async fn login(
        client: &reqwest::Client,
        base_url: &str,
        identifier: &str,
        app_password: &str,
    ) -> Result<String> {
        let url = format!("{base_url}/xrpc/com.atproto.server.createSession");
        let session: Session = client
            .post(&url)
            .json(&serde_json::json!({
                "identifier": identifier,
                "password": app_password,
            }))
            .send()
            .await
            .context("bluesky createSession post()")?
            .error_for_status()
            .context("bluesky login rejected")?
            .json()
            .await
            .context("decoding bluesky session")?;
        Ok(session.access_jwt)
    }

    /// Collect pages until the cursor bound is crossed, the cursor repeats,
    /// or the page cap is hit. Results arrive newest-first.
    async fn fetch_all(&self, position: Option<u64>, limit: usize) -> Result<Vec<FetchedItem>> {
        match &self.mode {
            Mode::Fixture(s) => Ok(Self::parse_search(s)?.0),
            Mode::Http {
                base_url,
                identifier,
                app_password,
                client,
            } => {
                let jwt = Self::login(client, base_url, identifier, app_password).await?;
                let url = format!("{base_url}/xrpc/app.bsky.feed.searchPosts");

                let mut collected = Vec::new();
                let mut seen_cursors: HashSet<String> = HashSet::new();
                let mut cursor: Option<String> = None;

                let limit_s = limit.to_string();
                for _ in 0..MAX_PAGES {
                    let mut req = client
                        .get(&url)
                        .bearer_auth(&jwt)
                        .query(&[("q", self.query.as_str()), ("limit", limit_s.as_str())]);
                    if let Some(c) = &cursor {
                        req = req.query(&[("cursor", c.as_str())]);
                    }
                    let body = req
                        .send()
                        .await
                        .context("bluesky searchPosts get()")?
                        .error_for_status()
                        .context("bluesky searchPosts http status")?
                        .text()
                        .await
                        .context("bluesky searchPosts .text()")?;

                    let (items, next_cursor) = Self::parse_search(&body)?;
                    if items.is_empty() {
                        break;
                    }
                    let page_floor = items.iter().map(|it| it.position).min().unwrap_or(0);
                    collected.extend(items);

                    // newest-first: once a page dips below the bound, older
                    // pages cannot contain anything new
                    if position.is_some_and(|pos| page_floor <= pos) {
                        break;
                    }
                    match next_cursor {
                        Some(c) if seen_cursors.insert(c.clone()) => cursor = Some(c),
                        _ => break,
                    }
                }
                Ok(collected)
            }
        }
    }
}

fn parse_rfc3339_to_unix(ts: &str) -> u64 {
    OffsetDateTime::parse(ts, &Rfc3339)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|x| u64::try_from(x).ok())
        .unwrap_or(0)
}

#[async_trait::async_trait]
impl ContentSource for BlueskySource {
    fn name(&self) -> &'static str {
        "bluesky"
    }

    fn identity(&self) -> IdentityStrategy {
        IdentityStrategy::NativeId
    }

    async fn fetch_since(
        &self,
        position: Option<u64>,
        limit: usize,
    ) -> Result<Vec<FetchedItem>> {
        match position {
            None => {
                let items = ascending(self.fetch_all(None, 1).await?);
                Ok(items.into_iter().last().into_iter().collect())
            }
            Some(pos) => Ok(ascending(newer_than(
                self.fetch_all(Some(pos), limit).await?,
                Some(pos),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc3339_parses_to_unix_seconds() {
        assert_eq!(parse_rfc3339_to_unix("2025-04-03T10:22:41Z"), 1_743_675_761);
        assert_eq!(parse_rfc3339_to_unix("2025-04-03T10:22:41.123Z"), 1_743_675_761);
        assert_eq!(parse_rfc3339_to_unix("garbage"), 0);
    }
}
