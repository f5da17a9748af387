//! Command handlers for the CLI.
//!
//! Each handler is called from `main` once config and the pool exist, and
//! prints a one-line summary of what it did.

use chrono::Utc;
use sqlx::PgPool;
use vidit_core::AppConfig;
use vidit_db::PgStore;
use vidit_fetch::{Fetchers, PipelineConfig, RankedBatch};

/// Run a fetch pass. With `dry_run`, rank only and print the top `limit` items.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built, sources cannot be
/// loaded, or the item upsert fails. Per-source failures are logged only.
pub(crate) async fn run_fetch(
    pool: PgPool,
    config: &AppConfig,
    dry_run: bool,
    limit: usize,
) -> anyhow::Result<()> {
    let store = PgStore::new(pool);
    let fetchers = Fetchers::from_config(config)?;
    let pipeline = PipelineConfig::from_app_config(config);
    tracing::info!(
        dry_run,
        max_concurrent_sources = pipeline.max_concurrent_sources,
        "starting fetch pass"
    );

    if dry_run {
        let batch = vidit_fetch::collect_ranked(&store, &fetchers, &pipeline, Utc::now()).await?;
        print_batch(&batch, limit);
        return Ok(());
    }

    let report = vidit_fetch::run_pass(&store, &fetchers, &pipeline, Utc::now()).await?;
    println!(
        "fetched {} items from {}/{} sources; {} unique, {} kept, {} written",
        report.fetched,
        report.sources - report.sources_failed,
        report.sources,
        report.unique,
        report.kept,
        report.written
    );
    Ok(())
}

fn print_batch(batch: &RankedBatch, limit: usize) {
    let report = &batch.report;
    println!(
        "dry-run: {} sources ({} failed), {} fetched, {} unique, {} kept",
        report.sources, report.sources_failed, report.fetched, report.unique, report.kept
    );
    for (rank, item) in batch.items.iter().take(limit).enumerate() {
        println!(
            "{:>3}. {:>8.4}  [{}] {}\n            {}",
            rank + 1,
            item.score,
            item.source_kind,
            item.title,
            item.url
        );
    }
}

/// Recompute and store scores for every persisted item.
///
/// # Errors
///
/// Returns an error if items cannot be loaded or written back.
pub(crate) async fn run_rescore(pool: PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let store = PgStore::new(pool);
    let pipeline = PipelineConfig::from_app_config(config);
    let written = vidit_fetch::rescore_stored(&store, &pipeline, Utc::now()).await?;
    println!("rescored {written} items");
    Ok(())
}

/// Delete stored near-duplicates.
///
/// # Errors
///
/// Returns an error if items cannot be loaded or deleted.
pub(crate) async fn run_dedup(pool: PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let store = PgStore::new(pool);
    let pipeline = PipelineConfig::from_app_config(config);
    let report = vidit_fetch::dedup_stored(&store, &pipeline).await?;
    println!(
        "examined {} items, deleted {} duplicates",
        report.examined, report.deleted
    );
    Ok(())
}

/// Apply pending migrations.
///
/// # Errors
///
/// Returns an error if a migration fails.
pub(crate) async fn run_migrate(pool: &PgPool) -> anyhow::Result<()> {
    let applied = vidit_db::run_migrations(pool).await?;
    println!("applied {applied} migrations");
    Ok(())
}
