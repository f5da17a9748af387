//! Database operations for the `items` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use vidit_core::{Item, SourceKind};

use crate::DbError;

/// Rows per `INSERT … ON CONFLICT` statement.
pub const UPSERT_BATCH_SIZE: usize = 100;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `items` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ItemRow {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub source_id: i64,
    pub source_kind: Option<String>,
    pub score: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ItemRow> for Item {
    /// Unrecognized stored kinds read back as `Unset`.
    fn from(row: ItemRow) -> Self {
        Item {
            title: row.title,
            url: row.url,
            published_at: row.published_at,
            source_id: row.source_id,
            source_kind: SourceKind::from_stored(row.source_kind.as_deref())
                .unwrap_or_default(),
            score: row.score,
        }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Inserts or updates items keyed by URL, in batches of [`UPSERT_BATCH_SIZE`].
///
/// On conflict the title, publication time, source fields and score are
/// overwritten. Each batch is a single statement; a failing batch aborts the
/// remaining ones. Returns the number of rows written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any batch fails.
pub async fn upsert_items(pool: &PgPool, items: &[Item]) -> Result<usize, DbError> {
    let mut written = 0usize;

    for batch in items.chunks(UPSERT_BATCH_SIZE) {
        let titles: Vec<&str> = batch.iter().map(|i| i.title.as_str()).collect();
        let urls: Vec<&str> = batch.iter().map(|i| i.url.as_str()).collect();
        let published: Vec<DateTime<Utc>> = batch.iter().map(|i| i.published_at).collect();
        let source_ids: Vec<i64> = batch.iter().map(|i| i.source_id).collect();
        let kinds: Vec<&str> = batch.iter().map(|i| i.source_kind.as_str()).collect();
        let scores: Vec<f64> = batch.iter().map(|i| i.score).collect();

        let result = sqlx::query(
            "INSERT INTO items (title, url, published_at, source_id, source_kind, score) \
             SELECT * FROM UNNEST($1::text[], $2::text[], $3::timestamptz[], $4::bigint[], \
                                  $5::text[], $6::float8[]) \
             ON CONFLICT (url) DO UPDATE \
             SET title = EXCLUDED.title, \
                 published_at = EXCLUDED.published_at, \
                 source_id = EXCLUDED.source_id, \
                 source_kind = EXCLUDED.source_kind, \
                 score = EXCLUDED.score, \
                 updated_at = NOW()",
        )
        .bind(&titles)
        .bind(&urls)
        .bind(&published)
        .bind(&source_ids)
        .bind(&kinds)
        .bind(&scores)
        .execute(pool)
        .await?;

        written += usize::try_from(result.rows_affected()).unwrap_or(batch.len());
        tracing::debug!(batch = batch.len(), written, "upserted item batch");
    }

    Ok(written)
}

/// Returns every persisted item, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_items(pool: &PgPool) -> Result<Vec<ItemRow>, DbError> {
    let rows = sqlx::query_as::<_, ItemRow>(
        "SELECT id, title, url, published_at, source_id, source_kind, score, created_at, updated_at \
         FROM items \
         ORDER BY published_at DESC, id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Hard-deletes items by URL. Returns the number of rows removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_items_by_url(pool: &PgPool, urls: &[String]) -> Result<usize, DbError> {
    if urls.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query("DELETE FROM items WHERE url = ANY($1)")
        .bind(urls)
        .execute(pool)
        .await?;

    Ok(usize::try_from(result.rows_affected()).unwrap_or(urls.len()))
}
