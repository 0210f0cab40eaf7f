//! Y Combinator directory enumeration
//!
//! The listing page embeds its company list in the `data-page` blob at
//! `props.companies.list[*].url`. A rendered listing (infinite scroll
//! already expanded) is read from its anchors instead.

use crate::crawler::fetcher::fetch_text;
use crate::crawler::parser::{collect_company_links, parse_data_page, resolve_link};
use crate::crawler::render::PageRenderer;
use crate::extract::Field;
use crate::output::{read_json, save_json};
use crate::HarvestError;
use reqwest::Client;
use serde_json::Value;
use std::path::Path;
use url::Url;

/// Reads company detail URLs out of a decoded listing blob
///
/// Listing order is preserved. Entries without a usable `url` are skipped.
pub fn company_urls_from_listing(blob: &Value, origin: &Url, max_items: Option<usize>) -> Vec<Url> {
    let entries = Field::of(blob).path(&["props", "companies", "list"]).items();
    let limit = max_items.unwrap_or(usize::MAX);

    entries
        .iter()
        .filter_map(|entry| {
            let href = Field::of(entry).get("url").opt_text()?;
            let resolved = resolve_link(&href, origin);
            if resolved.is_none() {
                tracing::debug!(href = %href, "Skipping listing entry");
            }
            resolved
        })
        .take(limit)
        .collect()
}

/// Fetches the listing page and enumerates company URLs
///
/// A non-200 listing, a missing blob or an undecodable blob is fatal.
///
/// # Arguments
///
/// * `client` - Shared HTTP client
/// * `listing_url` - Directory listing page
/// * `origin` - Origin that root-relative URLs resolve against
/// * `max_items` - Optional cap on the number of URLs returned
pub async fn list_urls(
    client: &Client,
    listing_url: &str,
    origin: &Url,
    max_items: Option<usize>,
) -> Result<Vec<Url>, HarvestError> {
    tracing::info!(url = listing_url, "Fetching directory listing");

    let html = fetch_text(client, listing_url).await?;
    let blob = parse_data_page(&html).map_err(|message| HarvestError::DirectoryBlob {
        url: listing_url.to_string(),
        message,
    })?;

    let urls = company_urls_from_listing(&blob, origin, max_items);
    tracing::info!(count = urls.len(), "Collected company URLs");
    Ok(urls)
}

/// Enumerates company URLs from a rendered listing page
///
/// Used when the listing only materializes its entries client-side.
pub async fn list_rendered_urls(
    renderer: &mut dyn PageRenderer,
    listing_url: &str,
    origin: &Url,
    max_items: Option<usize>,
) -> Result<Vec<Url>, HarvestError> {
    tracing::info!(url = listing_url, "Rendering directory listing");

    let html = renderer.render(listing_url).await?;
    let mut urls = collect_company_links(&html, origin);
    if let Some(max) = max_items {
        urls.truncate(max);
    }

    tracing::info!(count = urls.len(), "Collected company URLs");
    Ok(urls)
}

/// Persists a URL list as a JSON array of strings
pub fn save_url_list(path: &Path, urls: &[Url]) -> Result<(), HarvestError> {
    let strings: Vec<&str> = urls.iter().map(Url::as_str).collect();
    save_json(path, &strings)?;
    tracing::info!(path = %path.display(), count = urls.len(), "Saved URL list");
    Ok(())
}

/// Reads a URL list written by [`save_url_list`]
///
/// Entries that fail to parse are skipped with a warning.
pub fn load_url_list(path: &Path) -> Result<Vec<Url>, HarvestError> {
    let raw: Vec<String> = read_json(path)?;

    Ok(raw
        .into_iter()
        .filter_map(|entry| match Url::parse(&entry) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(url = %entry, error = %e, "Skipping invalid URL");
                None
            }
        })
        .collect())
}
