// src/cursor.rs
//! Cursor persistence: the per-stream "last processed position".
//!
//! Load failures collapse to cold start — a harvester must never crash on a
//! missing or unreadable cursor, at the cost of reprocessing overlap that
//! the idempotent doc identity absorbs. Saves are best-effort and refuse to
//! move backwards.

use crate::store::DocumentStore;
use crate::types::Cursor;
use anyhow::{Context, Result};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

pub const DEFAULT_CURSOR_INDEX: &str = "harvest-cursors";

#[derive(Clone)]
pub struct CursorStore {
    store: Arc<dyn DocumentStore>,
    index: String,
}

impl CursorStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_index(store, DEFAULT_CURSOR_INDEX)
    }

    pub fn with_index(store: Arc<dyn DocumentStore>, index: impl Into<String>) -> Self {
        Self {
            store,
            index: index.into(),
        }
    }

    /// Fallible read, for callers that care about the distinction between
    /// "absent" and "backend down".
    pub async fn try_load(&self, stream_key: &str) -> Result<Option<Cursor>> {
        let doc = self
            .store
            .get(&self.index, stream_key)
            .await
            .with_context(|| format!("loading cursor for {stream_key}"))?;
        match doc {
            None => Ok(None),
            Some(v) => {
                let cursor: Cursor =
                    serde_json::from_value(v).context("decoding persisted cursor")?;
                Ok(Some(cursor))
            }
        }
    }

    /// Read with the cold-start policy applied: any failure is logged and
    /// treated as "no prior run".
    pub async fn load(&self, stream_key: &str) -> Option<Cursor> {
        match self.try_load(stream_key).await {
            Ok(c) => c,
            Err(e) => {
                warn!(stream = stream_key, error = ?e, "cursor load failed, treating as cold start");
                None
            }
        }
    }

    /// Persist the new position. Monotonic: a position below the currently
    /// stored one is refused (logged, not written). Errors are returned so
    /// the cycle can surface a degraded result, but the caller does not
    /// escalate them further.
    pub async fn save(&self, stream_key: &str, position: u64) -> Result<()> {
        if let Ok(Some(existing)) = self.try_load(stream_key).await {
            if existing.position > position {
                warn!(
                    stream = stream_key,
                    existing = existing.position,
                    attempted = position,
                    "refusing cursor regression"
                );
                return Ok(());
            }
        }

        let cursor = Cursor {
            stream_key: stream_key.to_string(),
            position,
            updated_at: chrono::Utc::now(),
        };
        self.store
            .upsert(&self.index, stream_key, &json!(cursor))
            .await
            .with_context(|| format!("saving cursor for {stream_key}"))
    }
}
