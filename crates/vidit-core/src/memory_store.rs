//! In-process [`Store`] used by tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::items::Item;
use crate::sources::Source;
use crate::store::{SourceUpdate, Store, StoreError};

#[derive(Debug, Default)]
struct Inner {
    sources: Vec<Source>,
    /// Items in first-insertion order; `index` maps URL to position.
    items: Vec<Item>,
    index: HashMap<String, usize>,
}

/// A mutex-guarded store with the same upsert-by-URL semantics as Postgres.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn with_sources(sources: Vec<Source>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                sources,
                ..Inner::default()
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Snapshot of every source, including soft-deleted ones.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Poisoned`] if a previous holder panicked.
    pub fn sources(&self) -> Result<Vec<Source>, StoreError> {
        Ok(self.lock()?.sources.clone())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn active_sources(&self) -> Result<Vec<Source>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.sources.iter().filter(|s| !s.deleted).cloned().collect())
    }

    async fn record_fetch(&self, update: &SourceUpdate) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let source = inner
            .sources
            .iter_mut()
            .find(|s| s.id == update.source_id)
            .ok_or(StoreError::SourceNotFound(update.source_id))?;
        source.last_fetched_at = Some(update.fetched_at);
        if let Some(kind) = update.kind {
            source.kind = kind;
        }
        if let Some(endpoint) = &update.endpoint {
            source.endpoint.clone_from(endpoint);
        }
        Ok(())
    }

    async fn upsert_items(&self, items: &[Item]) -> Result<usize, StoreError> {
        let mut inner = self.lock()?;
        for item in items {
            if let Some(&pos) = inner.index.get(&item.url) {
                inner.items[pos] = item.clone();
            } else {
                let pos = inner.items.len();
                inner.index.insert(item.url.clone(), pos);
                inner.items.push(item.clone());
            }
        }
        Ok(items.len())
    }

    async fn list_items(&self) -> Result<Vec<Item>, StoreError> {
        Ok(self.lock()?.items.clone())
    }

    async fn delete_items(&self, urls: &[String]) -> Result<usize, StoreError> {
        let mut inner = self.lock()?;
        let before = inner.items.len();
        inner.items.retain(|item| !urls.contains(&item.url));
        let removed = before - inner.items.len();
        let index = inner
            .items
            .iter()
            .enumerate()
            .map(|(pos, item)| (item.url.clone(), pos))
            .collect();
        inner.index = index;
        Ok(removed)
    }
}
