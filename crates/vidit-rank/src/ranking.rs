//! Cluster sizing, gravity scoring, and greedy score-ordered deduplication.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use vidit_core::{Item, SourceKind};

use crate::similarity::jaccard;
use crate::tokenize::{TokenSet, Tokenizer};

/// Base weight per acquisition kind. `Unset` is weighted as a feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceWeights {
    pub feed: f64,
    pub sitemap: f64,
    pub search_api: f64,
}

impl Default for SourceWeights {
    fn default() -> Self {
        Self {
            feed: 1.5,
            sitemap: 1.2,
            search_api: 1.0,
        }
    }
}

impl SourceWeights {
    #[must_use]
    pub fn for_kind(&self, kind: SourceKind) -> f64 {
        match kind {
            SourceKind::Feed | SourceKind::Unset => self.feed,
            SourceKind::Sitemap => self.sitemap,
            SourceKind::SearchApi => self.search_api,
        }
    }
}

/// Tunables for one ranking pass.
///
/// Thresholds are compared with a strict `>`: a pair is "same story" only
/// when its similarity exceeds the threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingConfig {
    pub cluster_threshold: f64,
    pub dedup_threshold: f64,
    pub cluster_weight: f64,
    pub decay: f64,
    pub weights: SourceWeights,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            cluster_threshold: 0.4,
            dedup_threshold: 0.35,
            cluster_weight: 2.5,
            decay: 1.8,
            weights: SourceWeights::default(),
        }
    }
}

/// Hours between publication and `now`, clamped to zero for future timestamps.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn elapsed_hours(published_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let millis = (now - published_at).num_milliseconds();
    (millis as f64 / 3_600_000.0).max(0.0)
}

/// Gravity score: `(w + c * cluster_weight) / (h + 2)^decay`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn gravity(config: &RankingConfig, kind: SourceKind, cluster_size: usize, hours: f64) -> f64 {
    let numerator = config.weights.for_kind(kind) + cluster_size as f64 * config.cluster_weight;
    numerator / (hours.max(0.0) + 2.0).powf(config.decay)
}

/// Result of greedy deduplication over a score-sorted batch.
#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    /// Survivors, still in descending score order.
    pub kept: Vec<Item>,
    pub dropped: Vec<Item>,
}

/// Scores, sorts, and deduplicates batches of items.
#[derive(Debug, Clone, Default)]
pub struct Ranker {
    config: RankingConfig,
    tokenizer: Tokenizer,
}

impl Ranker {
    #[must_use]
    pub fn new(config: RankingConfig) -> Self {
        Self::with_tokenizer(config, Tokenizer::default())
    }

    #[must_use]
    pub fn with_tokenizer(config: RankingConfig, tokenizer: Tokenizer) -> Self {
        Self { config, tokenizer }
    }

    #[must_use]
    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    #[must_use]
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Token set of every title, computed once per item.
    #[must_use]
    pub fn token_sets(&self, items: &[Item]) -> Vec<TokenSet> {
        items
            .iter()
            .map(|item| self.tokenizer.tokenize(&item.title))
            .collect()
    }

    /// For each set, the number of *other* sets whose similarity exceeds the
    /// cluster threshold.
    ///
    /// Only pairs sharing at least one token are compared. A pair with no
    /// shared token has similarity zero, which never exceeds a threshold in
    /// `[0, 1]`, so the counts match an exhaustive pairwise pass.
    #[must_use]
    pub fn cluster_sizes(&self, sets: &[TokenSet]) -> Vec<usize> {
        if self.config.cluster_threshold < 0.0 {
            return self.cluster_sizes_exhaustive(sets);
        }

        let mut postings: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, set) in sets.iter().enumerate() {
            for token in set {
                postings.entry(token.as_str()).or_default().push(i);
            }
        }

        let mut counts = vec![0usize; sets.len()];
        // visited[j] == i once pair (i, j) has been compared.
        let mut visited = vec![usize::MAX; sets.len()];
        for (i, set) in sets.iter().enumerate() {
            for token in set {
                let Some(list) = postings.get(token.as_str()) else {
                    continue;
                };
                let start = list.partition_point(|&j| j <= i);
                for &j in &list[start..] {
                    if visited[j] == i {
                        continue;
                    }
                    visited[j] = i;
                    if jaccard(set, &sets[j]) > self.config.cluster_threshold {
                        counts[i] += 1;
                        counts[j] += 1;
                    }
                }
            }
        }
        counts
    }

    fn cluster_sizes_exhaustive(&self, sets: &[TokenSet]) -> Vec<usize> {
        let mut counts = vec![0usize; sets.len()];
        for i in 0..sets.len() {
            for j in (i + 1)..sets.len() {
                if jaccard(&sets[i], &sets[j]) > self.config.cluster_threshold {
                    counts[i] += 1;
                    counts[j] += 1;
                }
            }
        }
        counts
    }

    /// Replace every item's score with its gravity score as of `now`.
    ///
    /// Returns the token sets, aligned with `items`, for reuse by the caller.
    pub fn score(&self, items: &mut [Item], now: DateTime<Utc>) -> Vec<TokenSet> {
        let sets = self.token_sets(items);
        let clusters = self.cluster_sizes(&sets);
        for (item, cluster_size) in items.iter_mut().zip(clusters) {
            let hours = elapsed_hours(item.published_at, now);
            item.score = gravity(&self.config, item.source_kind, cluster_size, hours);
        }
        sets
    }

    /// Score and stable-sort by descending score, without deduplication.
    #[must_use]
    pub fn rank(&self, mut items: Vec<Item>, now: DateTime<Utc>) -> Vec<Item> {
        self.score(&mut items, now);
        items.sort_by(|a, b| b.score.total_cmp(&a.score));
        items
    }

    /// Greedy deduplication of a batch already sorted by descending score.
    ///
    /// An item is dropped when its title similarity against any kept item
    /// exceeds the dedup threshold, so the highest-scored member of each
    /// duplicate group survives.
    #[must_use]
    pub fn dedup(&self, items: Vec<Item>) -> DedupOutcome {
        let sets = self.token_sets(&items);
        self.dedup_pairs(items.into_iter().zip(sets).collect())
    }

    /// The full ranking pass: cluster, score, sort, deduplicate.
    #[must_use]
    pub fn rank_and_dedup(&self, mut items: Vec<Item>, now: DateTime<Utc>) -> Vec<Item> {
        if items.is_empty() {
            return items;
        }
        let input = items.len();
        let sets = self.score(&mut items, now);

        let mut pairs: Vec<(Item, TokenSet)> = items.into_iter().zip(sets).collect();
        pairs.sort_by(|a, b| b.0.score.total_cmp(&a.0.score));

        let outcome = self.dedup_pairs(pairs);
        tracing::debug!(
            input,
            kept = outcome.kept.len(),
            dropped = outcome.dropped.len(),
            "ranking pass complete"
        );
        outcome.kept
    }

    fn dedup_pairs(&self, pairs: Vec<(Item, TokenSet)>) -> DedupOutcome {
        let mut kept: Vec<(Item, TokenSet)> = Vec::with_capacity(pairs.len());
        let mut dropped = Vec::new();
        for (item, tokens) in pairs {
            let duplicate = kept
                .iter()
                .any(|(_, kept_tokens)| jaccard(&tokens, kept_tokens) > self.config.dedup_threshold);
            if duplicate {
                dropped.push(item);
            } else {
                kept.push((item, tokens));
            }
        }
        DedupOutcome {
            kept: kept.into_iter().map(|(item, _)| item).collect(),
            dropped,
        }
    }
}
