//! Harvester binary entrypoint.
//!
//! Loads config, wires the document store and one harvest cycle per
//! configured stream, then either runs a single pass (`--once`) or polls
//! on the configured interval until interrupted.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use au_sentiment_harvester::config::{self, HarvesterConfig, StreamConfig};
use au_sentiment_harvester::cursor::CursorStore;
use au_sentiment_harvester::harvest::{HarvestConfig, HarvestCycle};
use au_sentiment_harvester::keywords::KeywordMatcher;
use au_sentiment_harvester::scheduler::{spawn_harvest_scheduler, SchedulerCfg, StreamLocks};
use au_sentiment_harvester::sentiment::LexiconScorer;
use au_sentiment_harvester::sources::{BlueskySource, ContentSource, MastodonSource, RedditSource};
use au_sentiment_harvester::store::{DocumentStore, ElasticStore};
use au_sentiment_harvester::types::Source;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("au_sentiment_harvester=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn build_source(stream: &StreamConfig) -> Result<Arc<dyn ContentSource>> {
    match stream.source {
        Source::Mastodon => {
            let base = std::env::var("MASTODON_BASE_URL")
                .unwrap_or_else(|_| "https://mastodon.au".to_string());
            let token = config::env_or_credential("MASTODON_ACCESS_TOKEN", "MASTODON_ACCESS_TOKEN");
            Ok(Arc::new(MastodonSource::from_url(&base, &token)?))
        }
        Source::Reddit => {
            let user_agent = std::env::var("REDDIT_USER_AGENT")
                .unwrap_or_else(|_| "au-sentiment-harvester/0.1".to_string());
            Ok(Arc::new(RedditSource::from_url(&stream.topic, &user_agent)?))
        }
        Source::Bluesky => {
            let identifier = config::env_or_credential("BLUESKY_HANDLE", "BLUESKY_HANDLE");
            let password = config::env_or_credential("BLUESKY_APP_PASSWORD", "BLUESKY_APP_PASSWORD");
            Ok(Arc::new(BlueskySource::from_url(
                &stream.topic,
                &identifier,
                &password,
            )?))
        }
    }
}

fn build_cycles(cfg: &HarvesterConfig) -> Result<Vec<Arc<HarvestCycle>>> {
    let username = config::env_or_credential("ES_USERNAME", "ES_USERNAME");
    let password = config::env_or_credential("ES_PASSWORD", "ES_PASSWORD");
    let store: Arc<dyn DocumentStore> = Arc::new(
        ElasticStore::new(&cfg.store.url, &username, &password, cfg.store.insecure)
            .context("building document store client")?,
    );
    let cursors = CursorStore::with_index(Arc::clone(&store), cfg.store.cursor_index.clone());

    let matcher = KeywordMatcher::new(cfg.harvester.keywords.clone())
        .with_whole_word(cfg.harvester.whole_word);
    let scorer = Arc::new(LexiconScorer::new());

    let mut cycles = Vec::with_capacity(cfg.streams.len());
    for stream in &cfg.streams {
        let source = build_source(stream)?;
        let harvest_cfg = HarvestConfig::new(stream.stream_key(), stream.index())
            .with_page_limit(cfg.harvester.page_limit)
            .with_sentinel(cfg.harvester.unscorable_sentinel);
        cycles.push(Arc::new(HarvestCycle::new(
            stream.source,
            source,
            Arc::clone(&store),
            cursors.clone(),
            matcher.clone(),
            scorer.clone(),
            harvest_cfg,
        )));
    }
    Ok(cycles)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = config::load_config_default()?;
    let cycles = build_cycles(&cfg)?;
    if cycles.is_empty() {
        anyhow::bail!("no streams configured");
    }

    let once = std::env::args().any(|a| a == "--once");
    if once {
        for cycle in &cycles {
            let report = cycle.run().await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        return Ok(());
    }

    let locks = Arc::new(StreamLocks::new());
    let handle = spawn_harvest_scheduler(
        cycles,
        SchedulerCfg {
            interval_secs: cfg.harvester.interval_secs,
        },
        locks,
    );

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    handle.abort();
    Ok(())
}
