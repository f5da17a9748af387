//! Database operations for the `sources` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use vidit_core::{Source, SourceKind};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `sources` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SourceRow {
    pub id: i64,
    pub name: String,
    pub endpoint: String,
    pub kind: Option<String>,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<SourceRow> for Source {
    type Error = DbError;

    fn try_from(row: SourceRow) -> Result<Self, Self::Error> {
        let kind = SourceKind::from_stored(row.kind.as_deref())
            .map_err(|source| DbError::InvalidKind { id: row.id, source })?;
        Ok(Source {
            id: row.id,
            name: row.name,
            endpoint: row.endpoint,
            kind,
            last_fetched_at: row.last_fetched_at,
            deleted: row.deleted_at.is_some(),
        })
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns all non-deleted sources, ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_sources(pool: &PgPool) -> Result<Vec<SourceRow>, DbError> {
    let rows = sqlx::query_as::<_, SourceRow>(
        "SELECT id, name, endpoint, kind, last_fetched_at, created_at, updated_at, deleted_at \
         FROM sources \
         WHERE deleted_at IS NULL \
         ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Stamps `last_fetched_at` and applies whichever of `kind` and `endpoint`
/// are given.
///
/// Returns `false` if no non-deleted source has `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails, including when `endpoint`
/// collides with another active source.
pub async fn record_source_fetch(
    pool: &PgPool,
    id: i64,
    kind: Option<SourceKind>,
    endpoint: Option<&str>,
    fetched_at: DateTime<Utc>,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE sources \
         SET last_fetched_at = $2, \
             kind = COALESCE($3, kind), \
             endpoint = COALESCE($4, endpoint), \
             updated_at = NOW() \
         WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .bind(fetched_at)
    .bind(kind.map(SourceKind::as_str))
    .bind(endpoint)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
