use thiserror::Error;
use vidit_core::StoreError;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("feed parse error: {0}")]
    Feed(#[from] feed_rs::parser::ParseFeedError),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("search API response parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("search API error: {0}")]
    Api(String),

    #[error("missing credential: {0} is not set")]
    MissingCredential(&'static str),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
