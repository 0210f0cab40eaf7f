//! Crawler module for fetching source pages
//!
//! This module contains the fetching side of a harvest, including:
//! - HTTP client construction and plain page fetching
//! - Paged REST walking with bounded rate-limit retries
//! - Embedded JSON blob and link parsing
//! - Directory enumeration and URL list persistence
//! - Page rendering over HTTP or WebDriver
//! - Overall pipeline coordination

mod coordinator;
mod directory;
mod fetcher;
mod pager;
mod parser;
mod render;

pub use coordinator::Coordinator;
pub use directory::{
    company_urls_from_listing, list_rendered_urls, list_urls, load_url_list, save_url_list,
};
pub use fetcher::{build_http_client, fetch_text};
pub use pager::{
    paginate, parse_items, CrunchbaseSource, FetchFailure, PageSource, RetryPolicy, SourcePage,
    StopReason, WalkSummary,
};
pub use parser::{collect_company_links, parse_data_page, resolve_link};
pub use render::{close_after, HttpRenderer, PageRenderer, ScrollPolicy, WebDriverRenderer};
