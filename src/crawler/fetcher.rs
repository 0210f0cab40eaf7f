//! HTTP client construction and plain page fetching
//!
//! This module handles:
//! - Building the shared HTTP client from `[http]` settings
//! - GET requests for HTML pages (directory listings, detail pages, news)
//! - Classifying non-success statuses and transport errors

use crate::config::HttpConfig;
use crate::HarvestError;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The `[http]` configuration section
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use company_harvest::config::HttpConfig;
/// use company_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page body as text
///
/// Redirects are followed by the client. Anything other than HTTP 200 is
/// reported as [`HarvestError::HttpStatus`]; network failures as
/// [`HarvestError::Http`].
pub async fn fetch_text(client: &Client, url: &str) -> Result<String, HarvestError> {
    tracing::debug!(url, "GET");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| classify_transport(url, source))?;

    let status = response.status();
    if status != StatusCode::OK {
        tracing::debug!(url, status = status.as_u16(), "Non-success response");
        return Err(HarvestError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response
        .text()
        .await
        .map_err(|source| classify_transport(url, source))
}

fn classify_transport(url: &str, source: reqwest::Error) -> HarvestError {
    if source.is_timeout() {
        tracing::warn!(url, "Request timeout");
    } else if source.is_connect() {
        tracing::warn!(url, "Connection refused");
    }

    HarvestError::Http {
        url: url.to_string(),
        source,
    }
}
