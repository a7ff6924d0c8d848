// src/config.rs
//! Harvester configuration: keyword list, streams, store endpoint, polling
//! knobs. Loaded from TOML or JSON with an env-var path override;
//! credentials come from env vars or a mounted credentials directory.

use crate::types::Source;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "HARVESTER_CONFIG_PATH";
pub const ENV_CREDENTIALS_DIR: &str = "HARVESTER_CREDENTIALS_DIR";

const DEFAULT_TOML_PATH: &str = "config/harvester.toml";
const DEFAULT_JSON_PATH: &str = "config/harvester.json";

#[derive(Debug, Clone, Deserialize)]
pub struct HarvesterConfig {
    pub harvester: HarvesterSection,
    #[serde(default)]
    pub streams: Vec<StreamConfig>,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HarvesterSection {
    pub keywords: Vec<String>,
    #[serde(default)]
    pub whole_word: bool,
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_sentinel")]
    pub unscorable_sentinel: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    pub source: Source,
    /// Subreddit, search query, or timeline name, depending on the source.
    pub topic: String,
    #[serde(default)]
    index: Option<String>,
}

impl StreamConfig {
    pub fn stream_key(&self) -> String {
        format!("{}:{}", self.source, self.topic)
    }

    pub fn index(&self) -> String {
        self.index
            .clone()
            .unwrap_or_else(|| format!("{}-posts", self.source))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_url")]
    pub url: String,
    /// Skip TLS verification (in-cluster self-signed certs).
    #[serde(default)]
    pub insecure: bool,
    #[serde(default = "default_cursor_index")]
    pub cursor_index: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            insecure: false,
            cursor_index: default_cursor_index(),
        }
    }
}

fn default_page_limit() -> usize {
    50
}
fn default_interval_secs() -> u64 {
    300
}
fn default_sentinel() -> f64 {
    crate::sentiment::UNSCORABLE_SENTINEL
}
fn default_store_url() -> String {
    "http://localhost:9200".to_string()
}
fn default_cursor_index() -> String {
    crate::cursor::DEFAULT_CURSOR_INDEX.to_string()
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<HarvesterConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_config(&content, ext.as_str())
}

/// Load config using env var + fallbacks:
/// 1) $HARVESTER_CONFIG_PATH
/// 2) config/harvester.toml
/// 3) config/harvester.json
pub fn load_config_default() -> Result<HarvesterConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        }
        return Err(anyhow!("HARVESTER_CONFIG_PATH points to non-existent path"));
    }
    let toml_p = PathBuf::from(DEFAULT_TOML_PATH);
    if toml_p.exists() {
        return load_config_from(&toml_p);
    }
    let json_p = PathBuf::from(DEFAULT_JSON_PATH);
    if json_p.exists() {
        return load_config_from(&json_p);
    }
    Err(anyhow!(
        "no config found: set {ENV_CONFIG_PATH} or provide {DEFAULT_TOML_PATH}"
    ))
}

fn parse_config(s: &str, hint_ext: &str) -> Result<HarvesterConfig> {
    let try_toml = hint_ext == "toml" || s.contains("[harvester]");
    if try_toml {
        if let Ok(v) = toml::from_str(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = serde_json::from_str(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = toml::from_str(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported config format"))
}

/// Read one credential file from a mounted directory (trailing whitespace
/// trimmed). Missing files are an error here; use [`credential_or_empty`]
/// for the tolerant variant.
pub fn read_credential(dir: &Path, name: &str) -> Result<String> {
    let path = dir.join(name);
    let content = fs::read_to_string(&path)
        .with_context(|| format!("reading credential {}", path.display()))?;
    Ok(content.trim().to_string())
}

/// The documented fallback: a missing or unreadable credential degrades to
/// an empty string (anonymous/unauthenticated mode) with a logged warning,
/// never an abort.
pub fn credential_or_empty(dir: &Path, name: &str) -> String {
    match read_credential(dir, name) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(credential = name, error = ?e, "credential unavailable, using empty");
            String::new()
        }
    }
}

/// Env var first, then the credentials directory, then empty.
pub fn env_or_credential(env_name: &str, file_name: &str) -> String {
    if let Ok(v) = std::env::var(env_name) {
        if !v.is_empty() {
            return v;
        }
    }
    if let Ok(dir) = std::env::var(ENV_CREDENTIALS_DIR) {
        return credential_or_empty(Path::new(&dir), file_name);
    }
    String::new()
}
