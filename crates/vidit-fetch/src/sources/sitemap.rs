//! Google News sitemap strategy.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use vidit_core::{Item, Source, SourceKind};

use super::Fetcher;
use crate::client::get_body;
use crate::error::FetchError;
use crate::filter::ContentFilter;

pub struct SitemapFetcher {
    client: Client,
    filter: ContentFilter,
}

impl SitemapFetcher {
    #[must_use]
    pub fn new(client: Client, filter: ContentFilter) -> Self {
        Self { client, filter }
    }
}

#[async_trait]
impl Fetcher for SitemapFetcher {
    fn kind(&self) -> SourceKind {
        SourceKind::Sitemap
    }

    async fn fetch(&self, source: &Source, target: &str) -> Result<Vec<Item>, FetchError> {
        let body = get_body(&self.client, target).await?;
        let xml = String::from_utf8_lossy(&body);
        let entries = parse_sitemap(&xml)?;
        Ok(entries_to_items(entries, source, &self.filter, Utc::now()))
    }
}

/// One `<url>` element of a sitemap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SitemapEntry {
    pub loc: String,
    /// `<news:title>`; empty for plain (non-news) entries.
    pub title: String,
    pub publication_date: String,
    /// `<news:keywords>`, split on commas.
    pub keywords: Vec<String>,
}

#[derive(Clone, Copy)]
enum Field {
    Loc,
    Title,
    PublicationDate,
    Keywords,
}

/// Parse a sitemap document into its `<url>` entries.
///
/// Element local names are matched, so the `news:` prefix (or any other
/// prefix bound to the news namespace) is not significant. `<loc>` is read
/// only as a direct child of `<url>`, and news fields only inside `<news>`,
/// so image and video extensions are ignored. Sitemap-index documents
/// contain no `<url>` elements and yield no entries.
///
/// # Errors
///
/// Returns [`FetchError::Xml`] if the XML is malformed.
pub fn parse_sitemap(xml: &str) -> Result<Vec<SitemapEntry>, FetchError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut entry = SitemapEntry::default();
    let mut depth = 0usize;
    let mut url_depth: Option<usize> = None;
    let mut in_news = false;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                let local = e.local_name();
                field = match (local.as_ref(), url_depth) {
                    (b"url", None) => {
                        url_depth = Some(depth);
                        in_news = false;
                        entry = SitemapEntry::default();
                        None
                    }
                    (b"news", Some(_)) => {
                        in_news = true;
                        None
                    }
                    (b"loc", Some(d)) if depth == d + 1 => Some(Field::Loc),
                    (b"title", _) if in_news => Some(Field::Title),
                    (b"publication_date", _) if in_news => Some(Field::PublicationDate),
                    (b"keywords", _) if in_news => Some(Field::Keywords),
                    _ => None,
                };
            }
            Ok(Event::End(e)) => {
                match e.local_name().as_ref() {
                    b"url" if url_depth == Some(depth) => {
                        url_depth = None;
                        entries.push(std::mem::take(&mut entry));
                    }
                    b"news" => in_news = false,
                    _ => {}
                }
                depth = depth.saturating_sub(1);
                field = None;
            }
            Ok(Event::Text(e)) => {
                if let Some(f) = field {
                    let text = e.unescape().unwrap_or_default();
                    push_field(&mut entry, f, &text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(f) = field {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    push_field(&mut entry, f, &text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(FetchError::Xml(e)),
            _ => {}
        }
    }

    Ok(entries)
}

fn push_field(entry: &mut SitemapEntry, field: Field, text: &str) {
    let text = text.trim();
    match field {
        Field::Loc => entry.loc.push_str(text),
        Field::Title => {
            if !entry.title.is_empty() {
                entry.title.push(' ');
            }
            entry.title.push_str(text);
        }
        Field::PublicationDate => entry.publication_date.push_str(text),
        Field::Keywords => entry.keywords.extend(
            text.split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
        ),
    }
}

/// Parse a news publication date.
///
/// Accepts RFC 3339, RFC 2822, W3C minute precision (`2026-03-01T10:00+01:00`),
/// a zone-less `YYYY-MM-DDTHH:MM:SS` (read as UTC), and a bare `YYYY-MM-DD`.
#[must_use]
pub fn parse_publication_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M%:z"))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
}

/// Turn parsed entries into candidates.
///
/// Entries without a news title are index entries and are skipped.
/// Unparseable dates fall back to `now`.
fn entries_to_items(
    entries: Vec<SitemapEntry>,
    source: &Source,
    filter: &ContentFilter,
    now: DateTime<Utc>,
) -> Vec<Item> {
    entries
        .into_iter()
        .filter(|e| !e.title.is_empty() && !e.loc.is_empty())
        .filter(|e| !filter.is_blocked(&e.title, &e.keywords))
        .map(|e| {
            let published_at = parse_publication_date(&e.publication_date).unwrap_or(now);
            Item::candidate(source, SourceKind::Sitemap, &e.title, &e.loc, published_at)
        })
        .collect()
}
