// tests/common/mod.rs
// Shared doubles for harvest cycle tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use au_sentiment_harvester::cursor::CursorStore;
use au_sentiment_harvester::harvest::{HarvestConfig, HarvestCycle};
use au_sentiment_harvester::identity::IdentityStrategy;
use au_sentiment_harvester::keywords::KeywordMatcher;
use au_sentiment_harvester::sentiment::{LexiconScorer, SentimentScorer};
use au_sentiment_harvester::sources::ContentSource;
use au_sentiment_harvester::store::{DocumentStore, MemoryStore};
use au_sentiment_harvester::types::{FetchedItem, Source};

#[allow(dead_code)]
pub const STREAM: &str = "reddit:australia";
#[allow(dead_code)]
pub const INDEX: &str = "reddit-posts";

pub struct MockSource {
    items: Mutex<Vec<FetchedItem>>,
    identity: IdentityStrategy,
    fail: AtomicBool,
}

#[allow(dead_code)]
impl MockSource {
    pub fn new(items: Vec<FetchedItem>) -> Self {
        Self {
            items: Mutex::new(items),
            identity: IdentityStrategy::Compound,
            fail: AtomicBool::new(false),
        }
    }

    pub fn with_identity(mut self, identity: IdentityStrategy) -> Self {
        self.identity = identity;
        self
    }

    pub fn set_fail(&self, on: bool) {
        self.fail.store(on, Ordering::SeqCst);
    }

    pub fn set_items(&self, items: Vec<FetchedItem>) {
        *self.items.lock().unwrap() = items;
    }
}

#[async_trait]
impl ContentSource for MockSource {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn identity(&self) -> IdentityStrategy {
        self.identity
    }

    async fn fetch_since(&self, position: Option<u64>, limit: usize) -> Result<Vec<FetchedItem>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("mock source down"));
        }
        let mut items = self.items.lock().unwrap().clone();
        items.sort_by_key(|it| it.position);
        match position {
            None => Ok(items.into_iter().last().into_iter().collect()),
            Some(pos) => {
                let mut out: Vec<_> = items.into_iter().filter(|it| it.position > pos).collect();
                out.truncate(limit);
                Ok(out)
            }
        }
    }
}

#[allow(dead_code)]
pub fn item(native_id: &str, position: u64, content: &str) -> FetchedItem {
    FetchedItem {
        native_id: native_id.to_string(),
        author: Some("tester".to_string()),
        raw_content: content.to_string(),
        created_at: format!("2025-04-03 10:22:{:02}", position % 60),
        position,
    }
}

#[allow(dead_code)]
pub fn build_cycle(
    source: Arc<dyn ContentSource>,
    docs: Arc<MemoryStore>,
    cursor_backend: Arc<MemoryStore>,
    keywords: &[&str],
) -> HarvestCycle {
    build_cycle_with_scorer(source, docs, cursor_backend, keywords, Arc::new(LexiconScorer::new()))
}

#[allow(dead_code)]
pub fn build_cycle_with_scorer(
    source: Arc<dyn ContentSource>,
    docs: Arc<MemoryStore>,
    cursor_backend: Arc<MemoryStore>,
    keywords: &[&str],
    scorer: Arc<dyn SentimentScorer>,
) -> HarvestCycle {
    let cursors = CursorStore::new(cursor_backend as Arc<dyn DocumentStore>);
    HarvestCycle::new(
        Source::Reddit,
        source,
        docs as Arc<dyn DocumentStore>,
        cursors,
        KeywordMatcher::new(keywords.iter().map(|s| s.to_string())),
        scorer,
        HarvestConfig::new(STREAM, INDEX),
    )
}

#[allow(dead_code)]
pub struct FailingScorer;

impl SentimentScorer for FailingScorer {
    fn score(&self, _text: &str) -> Result<f64> {
        Err(anyhow!("model unavailable"))
    }
}

#[allow(dead_code)]
pub struct ConstScorer(pub f64);

impl SentimentScorer for ConstScorer {
    fn score(&self, _text: &str) -> Result<f64> {
        Ok(self.0)
    }
}
