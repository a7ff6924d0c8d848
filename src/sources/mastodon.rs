// src/sources/mastodon.rs
//! Mastodon public-timeline source. Positions are the numeric status ids,
//! and the API's `since_id` parameter carries the cursor bound server-side.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::sources::{ascending, newer_than, ContentSource};
use crate::types::FetchedItem;

#[derive(Debug, Deserialize)]
struct Status {
    id: String,
    content: Option<String>,
    created_at: Option<String>,
    account: Option<Account>,
}

#[derive(Debug, Deserialize)]
struct Account {
    acct: Option<String>,
}

pub struct MastodonSource {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        base_url: String,
        access_token: String,
        client: reqwest::Client,
    },
}

impl MastodonSource {
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_url(base_url: &str, access_token: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("building mastodon http client")?;
        Ok(Self {
            mode: Mode::Http {
                base_url: base_url.trim_end_matches('/').to_string(),
                access_token: access_token.to_string(),
                client,
            },
        })
    }

    pub fn parse_statuses(s: &str) -> Result<Vec<FetchedItem>> {
        let statuses: Vec<Status> = serde_json::from_str(s).context("parsing mastodon timeline json")?;
        let mut out = Vec::with_capacity(statuses.len());
        for st in statuses {
            let position = st.id.parse::<u64>().unwrap_or(0);
            out.push(FetchedItem {
                native_id: st.id,
                author: st.account.and_then(|a| a.acct),
                raw_content: st.content.unwrap_or_default(),
                created_at: st.created_at.unwrap_or_default(),
                position,
            });
        }
        Ok(out)
    }

    async fn fetch_page(&self, since_id: Option<u64>, limit: usize) -> Result<Vec<FetchedItem>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_statuses(s),
            Mode::Http {
                base_url,
                access_token,
                client,
            } => {
                let url = format!("{base_url}/api/v1/timelines/public");
                let mut req = client
                    .get(&url)
                    .bearer_auth(access_token)
                    .query(&[("limit", limit.to_string()), ("remote", "true".into())]);
                if let Some(id) = since_id {
                    req = req.query(&[("since_id", id.to_string())]);
                }
                let body = req
                    .send()
                    .await
                    .context("mastodon timeline get()")?
                    .error_for_status()
                    .context("mastodon timeline http status")?
                    .text()
                    .await
                    .context("mastodon timeline .text()")?;
                Self::parse_statuses(&body)
            }
        }
    }
}

#[async_trait::async_trait]
impl ContentSource for MastodonSource {
    fn name(&self) -> &'static str {
        "mastodon"
    }

    async fn fetch_since(
        &self,
        position: Option<u64>,
        limit: usize,
    ) -> Result<Vec<FetchedItem>> {
        match position {
            None => {
                // cold-start anchor: newest single status
                let items = ascending(self.fetch_page(None, 1).await?);
                Ok(items.into_iter().last().into_iter().collect())
            }
            Some(pos) => {
                let items = self.fetch_page(Some(pos), limit).await?;
                let mut items = ascending(newer_than(items, Some(pos)));
                items.truncate(limit);
                Ok(items)
            }
        }
    }
}
