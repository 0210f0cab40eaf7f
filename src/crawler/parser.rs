//! HTML parsing for directory and detail pages
//!
//! Y Combinator pages ship their data as JSON inside the `data-page`
//! attribute of a `<div>`. This module handles:
//! - Locating and decoding that embedded blob
//! - Resolving root-relative links against the directory origin
//! - Collecting company links from rendered listing markup

use scraper::{Html, Selector};
use serde_json::Value;
use std::collections::HashSet;
use url::Url;

/// Links under this prefix are founder pages, not companies
const FOUNDERS_PREFIX: &str = "/companies/founders";

/// Extracts and decodes the JSON embedded in `div[data-page]`
///
/// The attribute value is HTML-entity-decoded by the HTML parser before it
/// is handed to `serde_json`.
///
/// # Returns
///
/// * `Ok(Value)` - The decoded blob
/// * `Err(String)` - No blob on the page, or the blob is not valid JSON
///
/// # Example
///
/// ```
/// use company_harvest::crawler::parse_data_page;
///
/// let html = r#"<div data-page="{&quot;props&quot;:{&quot;n&quot;:1}}"></div>"#;
/// let blob = parse_data_page(html).unwrap();
/// assert_eq!(blob["props"]["n"], 1);
/// ```
pub fn parse_data_page(html: &str) -> Result<Value, String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("div[data-page]").map_err(|e| format!("{:?}", e))?;

    let raw = document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("data-page"))
        .ok_or_else(|| "no div[data-page] element".to_string())?;

    serde_json::from_str(raw).map_err(|e| format!("undecodable data-page blob: {}", e))
}

/// Resolves an href against `origin`
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel:, data: schemes
/// - fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, origin: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match origin.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute)
        }
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(href, error = %e, "Unresolvable link");
            None
        }
    }
}

/// Collects company links from rendered listing markup
///
/// Anchors whose `href` starts with `/companies/` are kept, unique in
/// first-seen order. Founder directory links are skipped.
pub fn collect_company_links(html: &str, origin: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let selector = match Selector::parse(r#"a[href^="/companies/"]"#) {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        let href = match element.value().attr("href") {
            Some(href) => href.trim(),
            None => continue,
        };

        if href.starts_with(FOUNDERS_PREFIX) || !seen.insert(href.to_string()) {
            continue;
        }

        if let Some(url) = resolve_link(href, origin) {
            links.push(url);
        }
    }

    links
}
