//! Fetched content items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sources::{Source, SourceKind};

/// Score assigned to an item before the ranking pass replaces it.
pub const PLACEHOLDER_SCORE: f64 = 1.0;

/// One piece of content, identified by its canonical URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Display text; also the similarity key.
    pub title: String,
    /// Identity key, unique across the corpus.
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub source_id: i64,
    /// Kind of the strategy that produced the item, captured at fetch time.
    pub source_kind: SourceKind,
    pub score: f64,
}

impl Item {
    /// Build a candidate produced by `kind` for `source`, with the placeholder score.
    #[must_use]
    pub fn candidate(
        source: &Source,
        kind: SourceKind,
        title: &str,
        url: &str,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.trim().to_string(),
            url: url.trim().to_string(),
            published_at,
            source_id: source.id,
            source_kind: kind,
            score: PLACEHOLDER_SCORE,
        }
    }
}
