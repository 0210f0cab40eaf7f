//! Page rendering backends
//!
//! A [`PageRenderer`] turns a URL into final DOM text. Static pages go
//! through [`HttpRenderer`]; pages that build their DOM client-side go
//! through a browser session driven over WebDriver ([`WebDriverRenderer`]).
//!
//! Whoever owns a renderer must call [`PageRenderer::close`] on every exit
//! path; [`close_after`] folds the close into a job's result.

use crate::crawler::fetcher::fetch_text;
use crate::HarvestError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thirtyfour::prelude::*;

/// Renders a page and returns its final DOM text
#[async_trait]
pub trait PageRenderer: Send {
    async fn render(&mut self, url: &str) -> Result<String, HarvestError>;

    /// Releases the underlying session; further renders fail
    async fn close(&mut self) -> Result<(), HarvestError>;
}

/// How a rendered page is scrolled before its DOM is read
///
/// Each step scrolls to the bottom and waits `settle` for lazily loaded
/// content. Scrolling stops once the page height stops growing or after
/// `max_rounds` steps; zero rounds reads the page without scrolling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollPolicy {
    pub settle: Duration,
    pub max_rounds: u32,
}

impl ScrollPolicy {
    pub fn new(settle_ms: u64, max_rounds: u32) -> Self {
        Self {
            settle: Duration::from_millis(settle_ms),
            max_rounds,
        }
    }

    /// Whether to scroll again after step `round` moved the height from
    /// `before` to `after`
    pub fn keep_scrolling(&self, round: u32, before: u64, after: u64) -> bool {
        round < self.max_rounds && after > before
    }
}

/// Plain GET through the shared HTTP client
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn render(&mut self, url: &str) -> Result<String, HarvestError> {
        fetch_text(&self.client, url).await
    }

    async fn close(&mut self) -> Result<(), HarvestError> {
        Ok(())
    }
}

/// Browser session driven through a WebDriver server
pub struct WebDriverRenderer {
    driver: Option<WebDriver>,
    ready_selector: String,
    wait_timeout: Duration,
    scroll: ScrollPolicy,
}

impl WebDriverRenderer {
    /// Opens a Chrome session on the WebDriver server at `server_url`
    ///
    /// # Arguments
    ///
    /// * `server_url` - WebDriver endpoint, e.g. `http://localhost:4444`
    /// * `ready_selector` - CSS selector whose presence marks a rendered page
    /// * `wait_timeout` - Upper bound on the readiness wait
    /// * `scroll` - Scrolling applied once the page is ready
    pub async fn connect(
        server_url: &str,
        ready_selector: &str,
        wait_timeout: Duration,
        scroll: ScrollPolicy,
    ) -> Result<Self, HarvestError> {
        let caps = DesiredCapabilities::chrome();
        let driver = WebDriver::new(server_url, caps).await?;
        driver.maximize_window().await?;

        tracing::info!(server = server_url, "WebDriver session started");

        Ok(Self {
            driver: Some(driver),
            ready_selector: ready_selector.to_string(),
            wait_timeout,
            scroll,
        })
    }

    fn session(&self, url: &str) -> Result<&WebDriver, HarvestError> {
        self.driver.as_ref().ok_or_else(|| HarvestError::Render {
            url: url.to_string(),
            message: "session already closed".to_string(),
        })
    }
}

#[async_trait]
impl PageRenderer for WebDriverRenderer {
    async fn render(&mut self, url: &str) -> Result<String, HarvestError> {
        let driver = self.session(url)?;
        driver.goto(url).await?;

        driver
            .query(By::Css(self.ready_selector.clone()))
            .wait(self.wait_timeout, Duration::from_millis(250))
            .first()
            .await
            .map_err(|e| HarvestError::Render {
                url: url.to_string(),
                message: format!("page not ready: {}", e),
            })?;

        let mut height = page_height(driver).await?;
        for round in 1..=self.scroll.max_rounds {
            driver
                .execute("window.scrollTo(0, document.body.scrollHeight);", Vec::new())
                .await?;
            if !self.scroll.settle.is_zero() {
                tokio::time::sleep(self.scroll.settle).await;
            }

            let grown = page_height(driver).await?;
            tracing::trace!(url, round, height = grown, "Scrolled");
            if !self.scroll.keep_scrolling(round, height, grown) {
                break;
            }
            height = grown;
        }

        Ok(driver.source().await?)
    }

    async fn close(&mut self) -> Result<(), HarvestError> {
        if let Some(driver) = self.driver.take() {
            driver.quit().await?;
            tracing::info!("WebDriver session closed");
        }
        Ok(())
    }
}

async fn page_height(driver: &WebDriver) -> Result<u64, HarvestError> {
    let height = driver
        .execute("return document.body.scrollHeight;", Vec::new())
        .await?;
    Ok(height.json().as_u64().unwrap_or(0))
}

/// Closes `renderer` and combines the result with the job `outcome`
///
/// The renderer is closed whether or not the job succeeded. A job error
/// takes precedence over a close error.
pub async fn close_after<T>(
    renderer: &mut dyn PageRenderer,
    outcome: Result<T, HarvestError>,
) -> Result<T, HarvestError> {
    let closed = renderer.close().await;

    match (outcome, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_error)) => {
            tracing::warn!(error = %close_error, "Failed to close renderer");
            Err(e)
        }
    }
}
