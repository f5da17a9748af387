//! [`Store`] over a Postgres pool.

use async_trait::async_trait;
use sqlx::PgPool;
use vidit_core::{Item, Source, SourceUpdate, Store, StoreError};

use crate::{items, sources};

/// The production [`Store`]: sources and items live in Postgres.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn active_sources(&self) -> Result<Vec<Source>, StoreError> {
        let rows = sources::list_active_sources(&self.pool).await?;
        let mut active = Vec::with_capacity(rows.len());
        for row in rows {
            match Source::try_from(row) {
                Ok(source) => active.push(source),
                Err(e) => tracing::warn!(error = %e, "skipping source with invalid kind"),
            }
        }
        Ok(active)
    }

    async fn record_fetch(&self, update: &SourceUpdate) -> Result<(), StoreError> {
        let found = sources::record_source_fetch(
            &self.pool,
            update.source_id,
            update.kind,
            update.endpoint.as_deref(),
            update.fetched_at,
        )
        .await?;
        if found {
            Ok(())
        } else {
            Err(StoreError::SourceNotFound(update.source_id))
        }
    }

    async fn upsert_items(&self, items: &[Item]) -> Result<usize, StoreError> {
        Ok(items::upsert_items(&self.pool, items).await?)
    }

    async fn list_items(&self) -> Result<Vec<Item>, StoreError> {
        let rows = items::list_items(&self.pool).await?;
        Ok(rows.into_iter().map(Item::from).collect())
    }

    async fn delete_items(&self, urls: &[String]) -> Result<usize, StoreError> {
        Ok(items::delete_items_by_url(&self.pool, urls).await?)
    }
}
