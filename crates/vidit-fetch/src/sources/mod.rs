//! Acquisition strategies.

mod feed;
mod search_api;
mod sitemap;

use std::sync::Arc;

use async_trait::async_trait;
use vidit_core::{AppConfig, Item, Source, SourceKind};

use crate::client::build_http_client;
use crate::error::FetchError;
use crate::filter::ContentFilter;

pub use feed::{parse_feed, FeedFetcher};
pub use search_api::SearchApiFetcher;
pub use sitemap::{parse_publication_date, parse_sitemap, SitemapEntry, SitemapFetcher};

/// One way of turning a source into candidate items.
///
/// Implementations never mutate the source; reclassification is the
/// waterfall's job once a strategy succeeds.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// The kind recorded on a source when this strategy succeeds.
    fn kind(&self) -> SourceKind;

    /// Fetch candidates for `source` from `target` (a feed URL, search
    /// domain, or sitemap URL as resolved by the waterfall).
    async fn fetch(&self, source: &Source, target: &str) -> Result<Vec<Item>, FetchError>;
}

/// The strategy set the waterfall draws from.
#[derive(Clone)]
pub struct Fetchers {
    pub feed: Arc<dyn Fetcher>,
    pub search_api: Arc<dyn Fetcher>,
    pub sitemap: Arc<dyn Fetcher>,
}

impl Fetchers {
    #[must_use]
    pub fn new(
        feed: Arc<dyn Fetcher>,
        search_api: Arc<dyn Fetcher>,
        sitemap: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            feed,
            search_api,
            sitemap,
        }
    }

    /// Build the HTTP-backed strategies from application config.
    ///
    /// A missing `NEWSAPI_KEY` is not an error here; the search strategy
    /// reports it per source as [`FetchError::MissingCredential`].
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, FetchError> {
        let client = build_http_client(config.fetch_timeout_secs, &config.fetch_user_agent)?;
        let filter = ContentFilter::default();

        Ok(Self::new(
            Arc::new(FeedFetcher::new(client.clone(), filter.clone())),
            Arc::new(SearchApiFetcher::new(
                client.clone(),
                &config.newsapi_base_url,
                config.newsapi_key.clone(),
                &config.newsapi_language,
                filter.clone(),
            )),
            Arc::new(SitemapFetcher::new(client, filter)),
        ))
    }

    /// The strategy registered for `kind`. `Unset` resolves to the feed strategy.
    #[must_use]
    pub fn for_kind(&self, kind: SourceKind) -> &dyn Fetcher {
        match kind {
            SourceKind::Feed | SourceKind::Unset => self.feed.as_ref(),
            SourceKind::SearchApi => self.search_api.as_ref(),
            SourceKind::Sitemap => self.sitemap.as_ref(),
        }
    }
}
