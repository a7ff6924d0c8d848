// src/store/elastic.rs
//! Minimal Elasticsearch-compatible client over reqwest: document upsert,
//! get-by-id, and search. Covers exactly what the harvester and the stats
//! layer need, nothing more.

use anyhow::{anyhow, Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use url::Url;

#[derive(Clone)]
pub struct ElasticStore {
    base: Url,
    client: Client,
    username: String,
    password: String,
}

impl ElasticStore {
    /// `insecure` skips TLS certificate verification, for in-cluster
    /// deployments with self-signed certs.
    pub fn new(base_url: &str, username: &str, password: &str, insecure: bool) -> Result<Self> {
        let base = Url::parse(base_url).context("parsing document store url")?;
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .danger_accept_invalid_certs(insecure)
            .build()
            .context("building document store http client")?;
        Ok(Self {
            base,
            client,
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// Build `{base}/{index}/{segments...}` with each segment
    /// percent-encoded, so ids containing `/` (AT-URIs) stay one segment.
    fn endpoint(&self, index: &str, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| anyhow!("document store url cannot be a base"))?;
            path.pop_if_empty();
            path.push(index);
            for s in segments {
                path.push(s);
            }
        }
        Ok(url)
    }
}

#[async_trait::async_trait]
impl super::DocumentStore for ElasticStore {
    async fn upsert(&self, index: &str, doc_id: &str, doc: &Value) -> Result<()> {
        let url = self.endpoint(index, &["_doc", doc_id])?;
        let resp = self
            .client
            .put(url)
            .basic_auth(&self.username, Some(&self.password))
            .json(doc)
            .send()
            .await
            .with_context(|| format!("upserting doc {doc_id} into {index}"))?;
        resp.error_for_status()
            .with_context(|| format!("store rejected doc {doc_id}"))?;
        Ok(())
    }

    async fn get(&self, index: &str, doc_id: &str) -> Result<Option<Value>> {
        let url = self.endpoint(index, &["_doc", doc_id])?;
        let resp = self
            .client
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .with_context(|| format!("fetching doc {doc_id} from {index}"))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: Value = resp
            .error_for_status()
            .with_context(|| format!("store error for doc {doc_id}"))?
            .json()
            .await
            .context("decoding store get response")?;
        Ok(body.get("_source").cloned())
    }

    async fn search(&self, index: &str, body: &Value) -> Result<Value> {
        let url = self.endpoint(index, &["_search"])?;
        let resp = self
            .client
            .post(url)
            .basic_auth(&self.username, Some(&self.password))
            .json(body)
            .send()
            .await
            .with_context(|| format!("searching {index}"))?;
        let out: Value = resp
            .error_for_status()
            .with_context(|| format!("search rejected for {index}"))?
            .json()
            .await
            .context("decoding search response")?;
        Ok(out)
    }
}
