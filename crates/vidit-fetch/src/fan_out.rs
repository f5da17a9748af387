//! Concurrent fetch across all sources and URL-level merge.

use std::collections::HashMap;

use futures::stream::{self, StreamExt};
use vidit_core::{Item, Source, SourceUpdate};

use crate::sources::Fetchers;
use crate::waterfall::{fetch_source, SourceFetch};

/// Aggregated output of one fan-out across every source.
#[derive(Debug, Clone, Default)]
pub struct FanOut {
    /// Candidates with duplicate URLs already merged.
    pub items: Vec<Item>,
    /// One entry per source whose waterfall succeeded.
    pub updates: Vec<SourceUpdate>,
    pub sources: usize,
    pub failed: usize,
    /// Candidate count before the URL merge.
    pub fetched: usize,
}

/// Fetch every source with at most `max_concurrent` waterfalls in flight.
///
/// A new waterfall starts as soon as any running one finishes. Results are
/// put back in source order before merging, so the merge is deterministic
/// regardless of which fetch finishes first. A failing source never fails
/// the whole fan-out.
pub async fn fetch_all(fetchers: &Fetchers, sources: &[Source], max_concurrent: usize) -> FanOut {
    let mut results: Vec<(usize, SourceFetch)> = stream::iter(sources.iter().enumerate())
        .map(|(index, source)| async move { (index, fetch_source(fetchers, source).await) })
        .buffer_unordered(max_concurrent.max(1))
        .collect()
        .await;
    results.sort_unstable_by_key(|(index, _)| *index);

    let mut fan_out = FanOut {
        sources: sources.len(),
        ..FanOut::default()
    };
    let mut collected = Vec::new();

    for (_, result) in results {
        match result.update {
            Some(update) => fan_out.updates.push(update),
            None => fan_out.failed += 1,
        }
        collected.extend(result.items);
    }

    fan_out.fetched = collected.len();
    fan_out.items = merge_by_url(collected);

    tracing::info!(
        sources = fan_out.sources,
        failed = fan_out.failed,
        fetched = fan_out.fetched,
        unique = fan_out.items.len(),
        "fan-out complete"
    );

    fan_out
}

/// Collapse items sharing a URL into one.
///
/// The item with the later publication time wins; on a tie the item
/// encountered later wins. Each surviving URL keeps the position of its
/// first occurrence.
#[must_use]
pub fn merge_by_url(items: Vec<Item>) -> Vec<Item> {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(items.len());
    let mut merged: Vec<Item> = Vec::with_capacity(items.len());

    for item in items {
        match positions.get(&item.url) {
            Some(&pos) => {
                if item.published_at >= merged[pos].published_at {
                    merged[pos] = item;
                }
            }
            None => {
                positions.insert(item.url.clone(), merged.len());
                merged.push(item);
            }
        }
    }

    merged
}
