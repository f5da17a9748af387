//! Keyword/domain search API strategy (NewsAPI `/v2/everything`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use vidit_core::{Item, Source, SourceKind};

use super::Fetcher;
use crate::error::FetchError;
use crate::filter::ContentFilter;

const PAGE_SIZE: &str = "100";

/// NewsAPI's placeholder for withdrawn articles.
const REMOVED_PLACEHOLDER: &str = "[Removed]";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<SearchArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchArticle {
    title: Option<String>,
    url: Option<String>,
    published_at: Option<DateTime<Utc>>,
}

pub struct SearchApiFetcher {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    language: String,
    filter: ContentFilter,
}

impl SearchApiFetcher {
    #[must_use]
    pub fn new(
        client: Client,
        base_url: &str,
        api_key: Option<String>,
        language: &str,
        filter: ContentFilter,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            language: language.to_string(),
            filter,
        }
    }
}

#[async_trait]
impl Fetcher for SearchApiFetcher {
    fn kind(&self) -> SourceKind {
        SourceKind::SearchApi
    }

    /// Query recent articles for the domain `target`.
    ///
    /// Items with an empty title or URL are skipped. Only titles are
    /// filtered; the endpoint exposes no category tags.
    async fn fetch(&self, source: &Source, target: &str) -> Result<Vec<Item>, FetchError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(FetchError::MissingCredential("NEWSAPI_KEY"))?;

        let url = format!("{}/v2/everything", self.base_url);
        tracing::debug!(source = %source.name, domain = target, "search API request");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("domains", target),
                ("apiKey", api_key),
                ("pageSize", PAGE_SIZE),
                ("sortBy", "publishedAt"),
                ("language", self.language.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let bytes = response.bytes().await?;
        let body: SearchResponse = serde_json::from_slice(&bytes)?;
        if body.status != "ok" {
            return Err(FetchError::Api(
                body.message
                    .unwrap_or_else(|| format!("status {:?}", body.status)),
            ));
        }

        let now = Utc::now();
        let items = body
            .articles
            .into_iter()
            .filter_map(|article| {
                let title = article.title.unwrap_or_default();
                let link = article.url.unwrap_or_default();
                if title.trim().is_empty() || link.trim().is_empty() || title == REMOVED_PLACEHOLDER
                {
                    return None;
                }
                if self.filter.is_blocked::<&str>(&title, &[]) {
                    return None;
                }
                Some(Item::candidate(
                    source,
                    SourceKind::SearchApi,
                    &title,
                    &link,
                    article.published_at.unwrap_or(now),
                ))
            })
            .collect();

        Ok(items)
    }
}
