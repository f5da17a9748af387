//! The persistence capability the pipeline is handed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::items::Item;
use crate::sources::{Source, SourceKind};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("source {0} not found")]
    SourceNotFound(i64),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Outcome of one source's successful waterfall, applied after the fan-out joins.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceUpdate {
    pub source_id: i64,
    /// `Some` only when the successful strategy differs from the recorded kind.
    pub kind: Option<SourceKind>,
    /// The target the successful strategy used, when it differs from the
    /// recorded endpoint. Set together with `kind` so a reclassified source
    /// stays fetchable by its new strategy.
    pub endpoint: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

/// Source definitions and previously ingested items, upserted by URL.
#[async_trait]
pub trait Store: Send + Sync {
    /// All sources that are not soft-deleted.
    async fn active_sources(&self) -> Result<Vec<Source>, StoreError>;

    /// Stamp the last-fetch time and, when `update.kind` or `update.endpoint`
    /// is set, reclassify the source.
    async fn record_fetch(&self, update: &SourceUpdate) -> Result<(), StoreError>;

    /// Insert or overwrite items keyed by URL. Returns the number of rows written.
    async fn upsert_items(&self, items: &[Item]) -> Result<usize, StoreError>;

    async fn list_items(&self) -> Result<Vec<Item>, StoreError>;

    /// Hard-delete items by URL. Returns the number of rows removed.
    async fn delete_items(&self, urls: &[String]) -> Result<usize, StoreError>;
}
