//! Per-source strategy fallback.
//!
//! A source declared `feed` (or not yet classified) tries the feed, then the
//! search API against its derived domain, then a guessed news sitemap. A
//! source explicitly declared `search-api` or `sitemap` tries only that
//! strategy: an explicit classification is final for that kind.

use chrono::Utc;
use vidit_core::{Item, Source, SourceKind, SourceUpdate};

use crate::sources::Fetchers;

/// One step of a source's waterfall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub kind: SourceKind,
    /// Feed URL, search domain, or sitemap URL.
    pub target: String,
}

/// What one source's waterfall produced.
#[derive(Debug, Clone, Default)]
pub struct SourceFetch {
    pub items: Vec<Item>,
    /// Present only when a strategy succeeded.
    pub update: Option<SourceUpdate>,
}

impl SourceFetch {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.update.is_some()
    }
}

/// Host of an endpoint with scheme, path, port and a leading `www.` removed.
///
/// Bare domains (`example.com`, `www.example.com/news`) are accepted as well
/// as full URLs. Returns `None` when no host can be found.
#[must_use]
pub fn derive_domain(endpoint: &str) -> Option<String> {
    let endpoint = endpoint.trim();
    let is_url = endpoint.split_once("://").is_some_and(|(scheme, _)| {
        scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https")
    });
    let host = if is_url {
        reqwest::Url::parse(endpoint)
            .ok()?
            .host_str()
            .map(str::to_owned)?
    } else {
        endpoint
            .split(['/', '?', '#'])
            .next()
            .map(|h| h.split(':').next().unwrap_or(h).to_string())?
    };

    let host = host.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    (!host.is_empty()).then(|| host.to_string())
}

/// Conventional news sitemap location for a bare domain.
#[must_use]
pub fn guessed_sitemap_url(domain: &str) -> String {
    format!("https://{domain}/sitemap_news.xml")
}

/// The ordered strategies to try for `source`.
#[must_use]
pub fn plan(source: &Source) -> Vec<Attempt> {
    let endpoint = source.endpoint.trim();
    match source.kind {
        SourceKind::Feed | SourceKind::Unset => {
            let mut attempts = vec![Attempt {
                kind: SourceKind::Feed,
                target: endpoint.to_string(),
            }];
            if let Some(domain) = derive_domain(endpoint) {
                attempts.push(Attempt {
                    kind: SourceKind::SearchApi,
                    target: domain.clone(),
                });
                attempts.push(Attempt {
                    kind: SourceKind::Sitemap,
                    target: guessed_sitemap_url(&domain),
                });
            }
            attempts
        }
        SourceKind::SearchApi => vec![Attempt {
            kind: SourceKind::SearchApi,
            target: endpoint.to_string(),
        }],
        SourceKind::Sitemap => vec![Attempt {
            kind: SourceKind::Sitemap,
            target: endpoint.to_string(),
        }],
    }
}

/// Run `source`'s waterfall, stopping at the first strategy with at least one item.
///
/// Failures and empty results are logged and fall through; exhausting every
/// strategy yields an empty [`SourceFetch`] without an update.
pub async fn fetch_source(fetchers: &Fetchers, source: &Source) -> SourceFetch {
    for attempt in plan(source) {
        let fetcher = fetchers.for_kind(attempt.kind);
        match fetcher.fetch(source, &attempt.target).await {
            Ok(items) if !items.is_empty() => {
                let kind = fetcher.kind();
                if kind != source.kind {
                    tracing::info!(
                        source = %source.name,
                        from = %source.kind,
                        to = %kind,
                        target = %attempt.target,
                        "reclassifying source"
                    );
                }
                tracing::debug!(
                    source = %source.name,
                    kind = %kind,
                    count = items.len(),
                    "fetched source"
                );
                let reclassified = kind != source.kind;
                let endpoint = (reclassified && attempt.target != source.endpoint)
                    .then_some(attempt.target);
                return SourceFetch {
                    items,
                    update: Some(SourceUpdate {
                        source_id: source.id,
                        kind: reclassified.then_some(kind),
                        endpoint,
                        fetched_at: Utc::now(),
                    }),
                };
            }
            Ok(_) => {
                tracing::warn!(
                    source = %source.name,
                    kind = %attempt.kind,
                    target = %attempt.target,
                    "strategy returned no items"
                );
            }
            Err(e) => {
                tracing::warn!(
                    source = %source.name,
                    kind = %attempt.kind,
                    target = %attempt.target,
                    error = %e,
                    "strategy failed"
                );
            }
        }
    }

    tracing::warn!(
        source = %source.name,
        endpoint = %source.endpoint,
        "all fetch strategies failed"
    );
    SourceFetch::default()
}
