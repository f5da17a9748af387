//! Shared HTTP client construction.

use std::time::Duration;

use reqwest::Client;

use crate::error::FetchError;

const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Build the client every strategy shares.
///
/// `timeout_secs` bounds each request end to end; a timeout surfaces as
/// [`FetchError::Http`] and is handled like any other strategy failure.
///
/// # Errors
///
/// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
/// cannot be constructed (e.g., invalid TLS config).
pub fn build_http_client(timeout_secs: u64, user_agent: &str) -> Result<Client, FetchError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS.min(timeout_secs.max(1))))
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

/// GET `url` and return the body, mapping non-2xx statuses to
/// [`FetchError::UnexpectedStatus`].
pub(crate) async fn get_body(client: &Client, url: &str) -> Result<Vec<u8>, FetchError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(response.bytes().await?.to_vec())
}
