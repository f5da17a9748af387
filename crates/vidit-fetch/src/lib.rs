//! Source acquisition and the fetch-score-dedup pipeline.
//!
//! Each [`Source`](vidit_core::Source) is fetched through a waterfall of
//! strategies (feed, search API, sitemap). All sources are fetched
//! concurrently, merged by URL, and handed to the
//! [`Ranker`](vidit_rank::Ranker). The persistence layer is injected as a
//! [`Store`](vidit_core::Store) and written only after the batch is final.

pub mod client;
pub mod error;
pub mod fan_out;
pub mod filter;
pub mod pipeline;
pub mod sources;
pub mod waterfall;

pub use error::FetchError;
pub use fan_out::{fetch_all, merge_by_url, FanOut};
pub use filter::ContentFilter;
pub use pipeline::{
    collect_ranked, dedup_stored, rescore_stored, run_pass, DedupReport, PassReport,
    PipelineConfig, RankedBatch,
};
pub use sources::{FeedFetcher, Fetcher, Fetchers, SearchApiFetcher, SitemapFetcher};
pub use waterfall::{derive_domain, fetch_source, guessed_sitemap_url, plan, Attempt, SourceFetch};
