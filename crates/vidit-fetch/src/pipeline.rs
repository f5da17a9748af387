//! Pipeline orchestration: fetch, merge, rank, persist.

use chrono::{DateTime, Utc};
use vidit_core::{AppConfig, Item, SourceUpdate, Store};
use vidit_rank::{Ranker, RankingConfig, SourceWeights};

use crate::error::FetchError;
use crate::fan_out::fetch_all;
use crate::sources::Fetchers;

/// Default cap on concurrently running source waterfalls.
pub const DEFAULT_MAX_CONCURRENT_SOURCES: usize = 16;

/// Tunables shared by every pipeline entry point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    pub ranking: RankingConfig,
    pub max_concurrent_sources: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ranking: RankingConfig::default(),
            max_concurrent_sources: DEFAULT_MAX_CONCURRENT_SOURCES,
        }
    }
}

impl PipelineConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            ranking: RankingConfig {
                cluster_threshold: config.rank_cluster_threshold,
                dedup_threshold: config.rank_dedup_threshold,
                cluster_weight: config.rank_cluster_weight,
                decay: config.rank_decay,
                weights: SourceWeights {
                    feed: config.rank_weight_feed,
                    sitemap: config.rank_weight_sitemap,
                    search_api: config.rank_weight_search_api,
                },
            },
            max_concurrent_sources: config.fetch_max_concurrent_sources,
        }
    }
}

/// Counters for one fetch pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    pub sources: usize,
    pub sources_failed: usize,
    /// Candidates returned by all strategies, before the URL merge.
    pub fetched: usize,
    /// Candidates left after the URL merge.
    pub unique: usize,
    /// Items left after similarity dedup.
    pub kept: usize,
    /// Rows written by the store; zero for a dry run.
    pub written: usize,
}

/// A ranked batch that has not been written anywhere yet.
#[derive(Debug, Clone, Default)]
pub struct RankedBatch {
    /// Descending by score, near-duplicates removed.
    pub items: Vec<Item>,
    pub updates: Vec<SourceUpdate>,
    pub report: PassReport,
}

/// Counters for a dedup sweep over persisted items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupReport {
    pub examined: usize,
    pub deleted: usize,
}

/// Fetch every active source and rank the merged result without writing.
///
/// # Errors
///
/// Returns [`FetchError::Store`] if the active sources cannot be loaded.
/// Per-source failures are logged and counted, never returned.
pub async fn collect_ranked(
    store: &dyn Store,
    fetchers: &Fetchers,
    config: &PipelineConfig,
    now: DateTime<Utc>,
) -> Result<RankedBatch, FetchError> {
    let sources = store.active_sources().await?;
    if sources.is_empty() {
        tracing::info!("no active sources");
        return Ok(RankedBatch::default());
    }

    let fan_out = fetch_all(fetchers, &sources, config.max_concurrent_sources).await;
    let unique = fan_out.items.len();

    let ranker = Ranker::new(config.ranking);
    let items = ranker.rank_and_dedup(fan_out.items, now);

    Ok(RankedBatch {
        report: PassReport {
            sources: fan_out.sources,
            sources_failed: fan_out.failed,
            fetched: fan_out.fetched,
            unique,
            kept: items.len(),
            written: 0,
        },
        items,
        updates: fan_out.updates,
    })
}

/// Run one complete fetch pass and persist the result.
///
/// Source updates and the item upsert happen only after every fetch has
/// finished. A pass in which every source fails writes nothing and still
/// succeeds. Re-running a pass over unchanged upstream content leaves the
/// stored rows unchanged apart from scores.
///
/// # Errors
///
/// Returns [`FetchError::Store`] if sources cannot be loaded or the item
/// upsert fails. A failed source update is logged and skipped.
pub async fn run_pass(
    store: &dyn Store,
    fetchers: &Fetchers,
    config: &PipelineConfig,
    now: DateTime<Utc>,
) -> Result<PassReport, FetchError> {
    let RankedBatch {
        items,
        updates,
        mut report,
    } = collect_ranked(store, fetchers, config, now).await?;

    for update in &updates {
        if let Err(e) = store.record_fetch(update).await {
            tracing::warn!(source_id = update.source_id, error = %e, "failed to record source fetch");
        }
    }

    if !items.is_empty() {
        report.written = store.upsert_items(&items).await?;
    }

    tracing::info!(
        sources = report.sources,
        failed = report.sources_failed,
        fetched = report.fetched,
        unique = report.unique,
        kept = report.kept,
        written = report.written,
        "fetch pass complete"
    );

    Ok(report)
}

/// Recompute cluster sizes and gravity scores for every persisted item.
///
/// No items are removed. Returns the number of rows written.
///
/// # Errors
///
/// Returns [`FetchError::Store`] if items cannot be loaded or written back.
pub async fn rescore_stored(
    store: &dyn Store,
    config: &PipelineConfig,
    now: DateTime<Utc>,
) -> Result<usize, FetchError> {
    let mut items = store.list_items().await?;
    if items.is_empty() {
        return Ok(0);
    }

    let ranker = Ranker::new(config.ranking);
    ranker.score(&mut items, now);
    let written = store.upsert_items(&items).await?;

    tracing::info!(items = items.len(), written, "rescore complete");
    Ok(written)
}

/// Remove persisted near-duplicates, keeping the best-scored of each group.
///
/// Uses the stored scores as-is; run [`rescore_stored`] first for fresh ones.
///
/// # Errors
///
/// Returns [`FetchError::Store`] if items cannot be loaded or deleted.
pub async fn dedup_stored(
    store: &dyn Store,
    config: &PipelineConfig,
) -> Result<DedupReport, FetchError> {
    let mut items = store.list_items().await?;
    let examined = items.len();
    items.sort_by(|a, b| b.score.total_cmp(&a.score));

    let outcome = Ranker::new(config.ranking).dedup(items);
    let urls: Vec<String> = outcome.dropped.into_iter().map(|item| item.url).collect();
    let deleted = if urls.is_empty() {
        0
    } else {
        store.delete_items(&urls).await?
    };

    tracing::info!(examined, deleted, "dedup sweep complete");
    Ok(DedupReport { examined, deleted })
}
