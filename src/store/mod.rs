// src/store/mod.rs
//! Document store seam. The harvest cycle and the stats layer only ever
//! talk to [`DocumentStore`]; production wires the Elasticsearch client,
//! tests wire [`MemoryStore`].

pub mod elastic;

use anyhow::{anyhow, Result};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub use elastic::ElasticStore;

#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Idempotent write: same id overwrites, never duplicates.
    async fn upsert(&self, index: &str, doc_id: &str, doc: &Value) -> Result<()>;

    /// Fetch a document's source by id. Ok(None) when it does not exist.
    async fn get(&self, index: &str, doc_id: &str) -> Result<Option<Value>>;

    /// Run a search/aggregation request body and return the raw response.
    async fn search(&self, index: &str, body: &Value) -> Result<Value>;
}

/// In-memory store for tests: keyed by (index, doc_id), with failure
/// injection knobs for exercising the cycle's degraded paths.
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<(String, String), Value>>,
    fail_upsert_ids: Mutex<HashSet<String>>,
    fail_gets: Mutex<bool>,
    fail_upserts_all: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `get` fail (simulates an unreadable cursor backend).
    pub fn fail_gets(&self, on: bool) {
        *self.fail_gets.lock().unwrap() = on;
    }

    /// Make every `upsert` fail (simulates an unwritable backend).
    pub fn fail_upserts(&self, on: bool) {
        *self.fail_upserts_all.lock().unwrap() = on;
    }

    /// Make upserts for one specific doc id fail.
    pub fn fail_upsert_id(&self, doc_id: &str) {
        self.fail_upsert_ids.lock().unwrap().insert(doc_id.to_string());
    }

    pub fn len(&self) -> usize {
        self.docs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn doc(&self, index: &str, doc_id: &str) -> Option<Value> {
        self.docs
            .lock()
            .unwrap()
            .get(&(index.to_string(), doc_id.to_string()))
            .cloned()
    }

    /// All doc ids in an index, sorted.
    pub fn ids(&self, index: &str) -> Vec<String> {
        let mut out: Vec<String> = self
            .docs
            .lock()
            .unwrap()
            .keys()
            .filter(|(ix, _)| ix == index)
            .map(|(_, id)| id.clone())
            .collect();
        out.sort();
        out
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn upsert(&self, index: &str, doc_id: &str, doc: &Value) -> Result<()> {
        if *self.fail_upserts_all.lock().unwrap() {
            return Err(anyhow!("memory store: upsert disabled"));
        }
        if self.fail_upsert_ids.lock().unwrap().contains(doc_id) {
            return Err(anyhow!("memory store: upsert failure injected for {doc_id}"));
        }
        self.docs
            .lock()
            .unwrap()
            .insert((index.to_string(), doc_id.to_string()), doc.clone());
        Ok(())
    }

    async fn get(&self, index: &str, doc_id: &str) -> Result<Option<Value>> {
        if *self.fail_gets.lock().unwrap() {
            return Err(anyhow!("memory store: get disabled"));
        }
        Ok(self.doc(index, doc_id))
    }

    async fn search(&self, _index: &str, _body: &Value) -> Result<Value> {
        Err(anyhow!("memory store: search not supported"))
    }
}
