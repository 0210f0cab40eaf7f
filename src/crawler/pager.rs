//! Paged REST source walking
//!
//! A [`PageSource`] turns a page number into a [`SourcePage`] or a
//! [`FetchFailure`]. [`paginate`] walks pages from 1 upward and stops on the
//! first empty page, the first failure, or the page ceiling.
//!
//! # Status handling
//!
//! | Condition | Action |
//! |-----------|--------|
//! | HTTP 200 | Parse `data.items` |
//! | HTTP 429 | Cool down and retry the same page, bounded |
//! | HTTP 401/403 | Fatal, aborts the run |
//! | Other status | Stop pagination |
//! | Transport error | Stop pagination |
//! | Unexpected body | Stop pagination |

use crate::config::CrunchbaseConfig;
use crate::HarvestError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::ops::ControlFlow;
use std::time::Duration;
use thiserror::Error;

/// One page of raw items; an empty page ends the walk
#[derive(Debug, Clone, PartialEq)]
pub struct SourcePage {
    pub page: u32,
    pub items: Vec<Value>,
}

impl SourcePage {
    pub fn is_terminal(&self) -> bool {
        self.items.is_empty()
    }
}

/// Why a single page could not be fetched
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("unauthorized (HTTP {status}) on page {page}")]
    Unauthorized { page: u32, status: u16 },

    #[error("still rate limited on page {page} after {attempts} attempts")]
    RateLimited { page: u32, attempts: u32 },

    #[error("unexpected HTTP {status} on page {page}")]
    Status { page: u32, status: u16 },

    #[error("transport error on page {page}: {source}")]
    Transport {
        page: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed payload on page {page}: {message}")]
    Malformed { page: u32, message: String },
}

impl FetchFailure {
    /// Fatal failures abort the whole run instead of just the walk
    pub fn is_fatal(&self) -> bool {
        matches!(self, FetchFailure::Unauthorized { .. })
    }

    pub fn page(&self) -> u32 {
        match self {
            FetchFailure::Unauthorized { page, .. }
            | FetchFailure::RateLimited { page, .. }
            | FetchFailure::Status { page, .. }
            | FetchFailure::Transport { page, .. }
            | FetchFailure::Malformed { page, .. } => *page,
        }
    }
}

/// Bounded exponential backoff for rate-limited pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub cooldown: Duration,
    pub max_cooldown: Duration,
    pub max_retries: u32,
}

impl RetryPolicy {
    pub fn from_config(config: &CrunchbaseConfig) -> Self {
        Self {
            cooldown: Duration::from_millis(config.cooldown_ms),
            max_cooldown: Duration::from_millis(config.max_cooldown_ms),
            max_retries: config.max_retries,
        }
    }

    /// Wait before retry number `attempt` (1-based): `cooldown * 2^(attempt-1)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.cooldown.saturating_mul(factor).min(self.max_cooldown)
    }
}

/// A paged collection of raw records
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches page `page` (1-based)
    async fn fetch_page(&self, page: u32) -> Result<SourcePage, FetchFailure>;
}

/// Crunchbase organizations endpoint
pub struct CrunchbaseSource {
    client: Client,
    base_url: String,
    api_key: String,
    page_size: u32,
    retry: RetryPolicy,
}

impl CrunchbaseSource {
    pub fn new(client: Client, config: &CrunchbaseConfig, api_key: String) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            api_key,
            page_size: config.page_size,
            retry: RetryPolicy::from_config(config),
        }
    }

    async fn request(&self, page: u32) -> Result<reqwest::Response, FetchFailure> {
        self.client
            .get(&self.base_url)
            .header("X-cb-user-key", &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .query(&[("page", page), ("limit", self.page_size)])
            .send()
            .await
            .map_err(|source| FetchFailure::Transport { page, source })
    }
}

#[async_trait]
impl PageSource for CrunchbaseSource {
    async fn fetch_page(&self, page: u32) -> Result<SourcePage, FetchFailure> {
        let mut attempts = 0;

        loop {
            attempts += 1;
            let response = self.request(page).await?;
            let status = response.status();

            match status {
                StatusCode::OK => {
                    let body = response
                        .text()
                        .await
                        .map_err(|source| FetchFailure::Transport { page, source })?;
                    return parse_items(page, &body);
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    if attempts > self.retry.max_retries {
                        return Err(FetchFailure::RateLimited { page, attempts });
                    }
                    let wait = self.retry.delay_for(attempts);
                    tracing::warn!(
                        page,
                        attempt = attempts,
                        wait_ms = wait.as_millis() as u64,
                        "Rate limit hit, cooling down"
                    );
                    tokio::time::sleep(wait).await;
                }
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    return Err(FetchFailure::Unauthorized {
                        page,
                        status: status.as_u16(),
                    });
                }
                _ => {
                    return Err(FetchFailure::Status {
                        page,
                        status: status.as_u16(),
                    });
                }
            }
        }
    }
}

/// Parses a `{data: {items: [...]}}` body
pub fn parse_items(page: u32, body: &str) -> Result<SourcePage, FetchFailure> {
    let value: Value = serde_json::from_str(body).map_err(|e| FetchFailure::Malformed {
        page,
        message: e.to_string(),
    })?;

    match value.get("data").and_then(|data| data.get("items")) {
        Some(Value::Array(items)) => Ok(SourcePage {
            page,
            items: items.clone(),
        }),
        Some(Value::Null) | None => Err(FetchFailure::Malformed {
            page,
            message: "missing data.items".to_string(),
        }),
        Some(_) => Err(FetchFailure::Malformed {
            page,
            message: "data.items is not an array".to_string(),
        }),
    }
}

/// Why a walk ended
#[derive(Debug)]
pub enum StopReason {
    /// A page came back with zero items
    Exhausted { page: u32 },
    /// The page ceiling was reached
    PageLimit { max_pages: u32 },
    /// A non-fatal failure stopped the walk
    Failed(FetchFailure),
    /// The consumer asked to stop after this page
    Halted { page: u32 },
}

/// Outcome of a completed walk
#[derive(Debug)]
pub struct WalkSummary {
    /// Pages that carried at least one item
    pub pages: u32,
    /// Items handed to the consumer
    pub items: usize,
    pub stop: StopReason,
}

/// Walks pages `1..=max_pages`, handing each non-empty page to `on_page`
///
/// `request_delay` is slept after every page that carried items, before the
/// next request. Non-fatal failures end the walk and are reported in the
/// summary; an auth failure is returned as [`HarvestError::Unauthorized`].
/// `on_page` returning `Break` ends the walk without another request.
pub async fn paginate<S, F>(
    source: &S,
    max_pages: u32,
    request_delay: Duration,
    mut on_page: F,
) -> Result<WalkSummary, HarvestError>
where
    S: PageSource + ?Sized,
    F: FnMut(SourcePage) -> ControlFlow<()>,
{
    let mut pages = 0;
    let mut items = 0;

    for page in 1..=max_pages {
        tracing::debug!(page, "Fetching page");

        let fetched = match source.fetch_page(page).await {
            Ok(fetched) => fetched,
            Err(failure) if failure.is_fatal() => {
                tracing::error!(page, error = %failure, "Aborting");
                let status = match failure {
                    FetchFailure::Unauthorized { status, .. } => status,
                    _ => 401,
                };
                return Err(HarvestError::Unauthorized { status });
            }
            Err(failure) => {
                tracing::warn!(page, error = %failure, "Stopping pagination");
                return Ok(WalkSummary {
                    pages,
                    items,
                    stop: StopReason::Failed(failure),
                });
            }
        };

        if fetched.is_terminal() {
            tracing::info!(page, "No more data");
            return Ok(WalkSummary {
                pages,
                items,
                stop: StopReason::Exhausted { page },
            });
        }

        pages += 1;
        items += fetched.items.len();
        tracing::info!(page, items = fetched.items.len(), "Fetched page");
        if on_page(fetched).is_break() {
            tracing::info!(page, "Walk halted by consumer");
            return Ok(WalkSummary {
                pages,
                items,
                stop: StopReason::Halted { page },
            });
        }

        if !request_delay.is_zero() {
            tokio::time::sleep(request_delay).await;
        }
    }

    tracing::warn!(max_pages, "Page ceiling reached");
    Ok(WalkSummary {
        pages,
        items,
        stop: StopReason::PageLimit { max_pages },
    })
}
