// src/harvest.rs
//! One polling pass over a stream: load cursor, fetch newer items, gate on
//! keywords, score, upsert, advance the cursor.
//!
//! Failure taxonomy:
//! - source fetch/auth failure is fatal to the cycle (cursor untouched);
//! - per-item anomalies (scorer, store upsert) are logged and skipped;
//! - cursor save failure degrades the result but the indexed documents
//!   stand.
//!
//! No error escapes [`HarvestCycle::run`]; every outcome is a
//! [`HarvestReport`].

use crate::cursor::CursorStore;
use crate::identity::doc_id;
use crate::keywords::KeywordMatcher;
use crate::normalize::normalize_content;
use crate::sentiment::{guard_score, SentimentScorer, UNSCORABLE_SENTINEL};
use crate::sources::ContentSource;
use crate::store::DocumentStore;
use crate::types::{HarvestedPost, Source};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// One-time metrics registration (so series show up on scrape).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("harvest_fetched_total", "Items fetched from sources.");
        describe_counter!("harvest_matched_total", "Items that matched a tracked keyword.");
        describe_counter!("harvest_indexed_total", "Matched items successfully upserted.");
        describe_counter!("harvest_item_errors_total", "Per-item upsert failures (skipped).");
        describe_counter!("harvest_fetch_errors_total", "Fatal fetch failures (cycle aborted).");
        describe_counter!(
            "harvest_cursor_save_errors_total",
            "Cursor save failures (degraded cycles)."
        );
        describe_counter!("harvest_runs_total", "Completed harvest cycles.");
        describe_gauge!("harvest_last_run_ts", "Unix ts when a cycle last finished.");
    });
}

/// Short anonymized id for a post body, for logs that must never carry raw
/// content.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("fetch failed for {stream}: {cause}")]
    Fetch { stream: String, cause: anyhow::Error },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleStatus {
    /// Cycle completed; cursor saved.
    Done,
    /// Cycle completed but the cursor save failed; next run re-scans
    /// overlap that idempotent doc ids absorb.
    Degraded,
    /// Fetch failed; nothing indexed, cursor untouched.
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct HarvestReport {
    pub stream_key: String,
    pub status: CycleStatus,
    pub fetched: usize,
    pub matched: usize,
    pub indexed: usize,
    pub cursor: Option<u64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Source + topic, e.g. "reddit:australia".
    pub stream_key: String,
    /// Index the matched documents land in, e.g. "reddit-posts".
    pub index: String,
    pub page_limit: usize,
    pub sentinel: f64,
}

impl HarvestConfig {
    pub fn new(stream_key: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            stream_key: stream_key.into(),
            index: index.into(),
            page_limit: 50,
            sentinel: UNSCORABLE_SENTINEL,
        }
    }

    pub fn with_page_limit(mut self, limit: usize) -> Self {
        self.page_limit = limit;
        self
    }

    pub fn with_sentinel(mut self, sentinel: f64) -> Self {
        self.sentinel = sentinel;
        self
    }
}

/// Dependencies are constructor-injected so tests can swap in doubles;
/// nothing here is a process-wide singleton.
pub struct HarvestCycle {
    platform: Source,
    source: Arc<dyn ContentSource>,
    store: Arc<dyn DocumentStore>,
    cursors: CursorStore,
    matcher: KeywordMatcher,
    scorer: Arc<dyn SentimentScorer>,
    cfg: HarvestConfig,
}

impl HarvestCycle {
    pub fn new(
        platform: Source,
        source: Arc<dyn ContentSource>,
        store: Arc<dyn DocumentStore>,
        cursors: CursorStore,
        matcher: KeywordMatcher,
        scorer: Arc<dyn SentimentScorer>,
        cfg: HarvestConfig,
    ) -> Self {
        Self {
            platform,
            source,
            store,
            cursors,
            matcher,
            scorer,
            cfg,
        }
    }

    pub fn stream_key(&self) -> &str {
        &self.cfg.stream_key
    }

    /// Run one full cycle. Never panics, never returns an error; the report
    /// carries the outcome.
    pub async fn run(&self) -> HarvestReport {
        ensure_metrics_described();
        let stream = self.cfg.stream_key.clone();

        match self.run_inner().await {
            Ok(report) => report,
            Err(HarvestError::Fetch { stream: s, cause }) => {
                counter!("harvest_fetch_errors_total").increment(1);
                warn!(stream = %s, error = ?cause, "harvest cycle aborted");
                HarvestReport {
                    stream_key: stream,
                    status: CycleStatus::Failed,
                    fetched: 0,
                    matched: 0,
                    indexed: 0,
                    cursor: None,
                    error: Some(cause.to_string()),
                }
            }
        }
    }

    async fn run_inner(&self) -> Result<HarvestReport, HarvestError> {
        let stream = self.cfg.stream_key.as_str();

        // COLD_START: resolve the starting position. With no prior cursor,
        // anchor to the source's most-recent item so the first run catches
        // up to "now" without backfilling history.
        let start_pos = match self.cursors.load(stream).await {
            Some(cursor) => Some(cursor.position),
            None => {
                let anchor = self
                    .source
                    .fetch_since(None, 1)
                    .await
                    .map_err(|e| HarvestError::Fetch {
                        stream: stream.to_string(),
                        cause: e,
                    })?;
                let pos = anchor.iter().map(|it| it.position).max().unwrap_or(0);
                info!(stream, anchor = pos, "cold start, anchoring to most recent item");
                Some(pos)
            }
        };
        let start_pos = start_pos.unwrap_or(0);

        // FETCHING: transport failure here is fatal, cursor stays put.
        let items = self
            .source
            .fetch_since(Some(start_pos), self.cfg.page_limit)
            .await
            .map_err(|e| HarvestError::Fetch {
                stream: stream.to_string(),
                cause: e,
            })?;

        // PROCESSING: every item advances the position watermark whether or
        // not it matches; only matched items are scored and upserted.
        let fetched = items.len();
        let mut matched = 0usize;
        let mut indexed = 0usize;
        let mut max_pos = start_pos;

        for item in items {
            max_pos = max_pos.max(item.position);

            let content = normalize_content(&item.raw_content);
            let keywords = self.matcher.matched_set(&content);
            if keywords.is_empty() {
                continue;
            }
            matched += 1;

            let score = guard_score(self.scorer.score(&content), self.cfg.sentinel);
            let id = doc_id(self.source.identity(), &item.native_id, &item.created_at);
            let post = HarvestedPost {
                id: item.native_id.clone(),
                source: self.platform,
                author: item.author.clone().unwrap_or_else(|| "N/A".to_string()),
                content,
                created_at: item.created_at.clone(),
                sentiment_score: score,
                matched_keywords: keywords.into_iter().collect(),
            };

            match self.store.upsert(&self.cfg.index, &id, &json!(post)).await {
                Ok(()) => {
                    indexed += 1;
                    info!(stream, doc = %id, content_id = %anon_hash(&post.content), "indexed post");
                }
                Err(e) => {
                    counter!("harvest_item_errors_total").increment(1);
                    warn!(stream, doc = %id, error = ?e, "failed to index post, skipping");
                }
            }
        }

        // ADVANCING: always runs once fetch succeeded, regardless of
        // per-item failures.
        let mut status = CycleStatus::Done;
        let mut error = None;
        if let Err(e) = self.cursors.save(stream, max_pos).await {
            counter!("harvest_cursor_save_errors_total").increment(1);
            warn!(stream, position = max_pos, error = ?e, "cursor save failed");
            status = CycleStatus::Degraded;
            error = Some(e.to_string());
        }

        counter!("harvest_fetched_total").increment(fetched as u64);
        counter!("harvest_matched_total").increment(matched as u64);
        counter!("harvest_indexed_total").increment(indexed as u64);
        counter!("harvest_runs_total").increment(1);
        gauge!("harvest_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);

        info!(stream, fetched, matched, indexed, cursor = max_pos, "harvest cycle done");

        Ok(HarvestReport {
            stream_key: stream.to_string(),
            status,
            fetched,
            matched,
            indexed,
            cursor: Some(max_pos),
            error,
        })
    }
}
