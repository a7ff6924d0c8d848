// src/sources/mod.rs
pub mod bluesky;
pub mod mastodon;
pub mod reddit;

use crate::identity::IdentityStrategy;
use crate::types::FetchedItem;
use anyhow::Result;

pub use bluesky::BlueskySource;
pub use mastodon::MastodonSource;
pub use reddit::RedditSource;

/// One pollable stream of posts on a platform.
#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// How this source derives stable document ids.
    fn identity(&self) -> IdentityStrategy {
        IdentityStrategy::Compound
    }

    /// Items strictly newer than `position`, in ascending position order,
    /// bounded by the page-size `limit`.
    ///
    /// With `position == None` (no lower bound) the source returns only its
    /// single most-recent item — the cold-start anchor — so a first run
    /// never backfills history.
    async fn fetch_since(&self, position: Option<u64>, limit: usize)
        -> Result<Vec<FetchedItem>>;
}

/// Sort ascending by native position; wire order from the platforms is
/// usually newest-first.
pub(crate) fn ascending(mut items: Vec<FetchedItem>) -> Vec<FetchedItem> {
    items.sort_by_key(|it| it.position);
    items
}

/// Apply the strictly-greater cursor bound client-side, regardless of what
/// the platform's own "since" parameter already filtered.
pub(crate) fn newer_than(items: Vec<FetchedItem>, position: Option<u64>) -> Vec<FetchedItem> {
    match position {
        Some(pos) => items.into_iter().filter(|it| it.position > pos).collect(),
        None => items,
    }
}
