// src/identity.rs
//! Document identity: the rule that makes re-harvesting idempotent.
//!
//! Re-indexing the same source item must produce the same id so the store
//! overwrites instead of duplicating. This is the system's only duplicate
//! prevention; there is no separate dedup index.

/// How a source derives its stable document id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityStrategy {
    /// The source contract guarantees native ids are never reused
    /// (e.g. Bluesky AT-URIs). Safe as the upsert key on its own.
    NativeId,
    /// Defensive compound key `{native_id}-{sanitized_created_at}` for
    /// sources where native ids might collide across logical events.
    Compound,
}

/// Replace `:` and `.` so the timestamp is safe as a storage key in all
/// downstream backends.
pub fn sanitize_timestamp(ts: &str) -> String {
    ts.replace([':', '.'], "-")
}

pub fn doc_id(strategy: IdentityStrategy, native_id: &str, created_at: &str) -> String {
    match strategy {
        IdentityStrategy::NativeId => native_id.to_string(),
        IdentityStrategy::Compound => {
            format!("{native_id}-{}", sanitize_timestamp(created_at))
        }
    }
}
