//! Content origins and their acquisition kinds.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// How a source's content is acquired.
///
/// `Unset` means no strategy has been recorded yet; the waterfall treats it
/// like [`SourceKind::Feed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SourceKind {
    #[serde(rename = "feed", alias = "rss")]
    Feed,
    #[serde(rename = "sitemap")]
    Sitemap,
    #[serde(rename = "search-api", alias = "newsapi")]
    SearchApi,
    #[default]
    #[serde(rename = "")]
    Unset,
}

impl SourceKind {
    /// Storage representation. `Unset` maps to the empty string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Feed => "feed",
            SourceKind::Sitemap => "sitemap",
            SourceKind::SearchApi => "search-api",
            SourceKind::Unset => "",
        }
    }

    /// Parse an optional stored value; `None` and blank strings are `Unset`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownSourceKind`] for unrecognized values.
    pub fn from_stored(value: Option<&str>) -> Result<Self, CoreError> {
        value.map_or(Ok(SourceKind::Unset), str::parse)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Unset => write!(f, "unset"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

impl FromStr for SourceKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(SourceKind::Unset),
            "feed" | "rss" => Ok(SourceKind::Feed),
            "sitemap" => Ok(SourceKind::Sitemap),
            "search-api" | "search_api" | "newsapi" => Ok(SourceKind::SearchApi),
            _ => Err(CoreError::UnknownSourceKind(s.to_string())),
        }
    }
}

/// A configured content origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: i64,
    pub name: String,
    /// Feed URL, sitemap URL, or bare domain, depending on `kind`.
    pub endpoint: String,
    #[serde(default)]
    pub kind: SourceKind,
    pub last_fetched_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted: bool,
}

impl Source {
    #[must_use]
    pub fn new(id: i64, name: &str, endpoint: &str, kind: SourceKind) -> Self {
        Self {
            id,
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            kind,
            last_fetched_at: None,
            deleted: false,
        }
    }
}
