//! RSS/Atom/JSON feed strategy.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use vidit_core::{Item, Source, SourceKind};

use super::Fetcher;
use crate::client::get_body;
use crate::error::FetchError;
use crate::filter::ContentFilter;

pub struct FeedFetcher {
    client: Client,
    filter: ContentFilter,
}

impl FeedFetcher {
    #[must_use]
    pub fn new(client: Client, filter: ContentFilter) -> Self {
        Self { client, filter }
    }
}

#[async_trait]
impl Fetcher for FeedFetcher {
    fn kind(&self) -> SourceKind {
        SourceKind::Feed
    }

    async fn fetch(&self, source: &Source, target: &str) -> Result<Vec<Item>, FetchError> {
        let body = get_body(&self.client, target).await?;
        parse_feed(&body, source, &self.filter, Utc::now())
    }
}

/// Parse a syndication document into candidates.
///
/// Entries without a title or link are skipped. Undated entries are stamped
/// with `now`. Entries blocked by `filter` (title or category) are dropped.
///
/// # Errors
///
/// Returns [`FetchError::Feed`] if the document is not a recognizable feed.
pub fn parse_feed(
    body: &[u8],
    source: &Source,
    filter: &ContentFilter,
    now: DateTime<Utc>,
) -> Result<Vec<Item>, FetchError> {
    let feed = feed_rs::parser::parse(body)?;

    let items = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let title = entry.title.map(|t| t.content).unwrap_or_default();
            let url = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))?;
            if title.trim().is_empty() || url.trim().is_empty() {
                return None;
            }

            let categories: Vec<String> = entry
                .categories
                .iter()
                .flat_map(|c| std::iter::once(c.term.clone()).chain(c.label.clone()))
                .collect();
            if filter.is_blocked(&title, &categories) {
                tracing::debug!(source = %source.name, title = %title, "filtered feed entry");
                return None;
            }

            let published_at = entry.published.or(entry.updated).unwrap_or(now);
            Some(Item::candidate(
                source,
                SourceKind::Feed,
                &title,
                &url,
                published_at,
            ))
        })
        .collect();

    Ok(items)
}
