//! Harvest coordinator - top-level pipeline drivers
//!
//! The coordinator owns the shared HTTP client and the result set of each
//! pipeline:
//! - Crunchbase API walk to CSV
//! - YC directory listing to a URL list file
//! - YC detail scrape merged into the JSON dump
//! - YC dump export to CSV or Excel
//! - Rendered Crunchbase profiles to CSV

use crate::config::{resolve_api_key, Config};
use crate::crawler::directory::{list_rendered_urls, list_urls, load_url_list, save_url_list};
use crate::crawler::fetcher::{build_http_client, fetch_text};
use crate::crawler::pager::{paginate, CrunchbaseSource, PageSource, StopReason};
use crate::crawler::parser::parse_data_page;
use crate::crawler::render::{close_after, PageRenderer};
use crate::extract::{
    extract_company, extract_organization, extract_profile, news_items, news_url,
    CrunchbaseRecord, Field, FounderRow, NewsItem, ProfileRecord, YcCompany,
};
use crate::output::{
    load_dump, merge_dump, read_json, save_json, write_csv, write_excel, ResultSet, WriteError,
};
use crate::HarvestError;
use reqwest::Client;
use serde_json::Value;
use std::ops::ControlFlow;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Main harvest coordinator structure
pub struct Coordinator {
    config: Config,
    client: Client,
    origin: Url,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The validated harvest configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - The HTTP client could not be built or the
    ///   directory origin is not a URL
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        let client = build_http_client(&config.http)?;
        let origin = Url::parse(&config.directory.origin)?;

        Ok(Self {
            config,
            client,
            origin,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Walks the Crunchbase API and writes the flattened organizations
    ///
    /// Returns the number of rows written.
    pub async fn run_crunchbase(&self) -> Result<usize, HarvestError> {
        let settings = &self.config.crunchbase;
        let api_key = resolve_api_key(&settings.api_key_env)?;
        let source = CrunchbaseSource::new(self.client.clone(), settings, api_key);

        let records = self.harvest_crunchbase(&source).await?;
        let written = write_csv(&records, Path::new(&settings.output))?;

        tracing::info!(rows = written, path = %settings.output, "Crunchbase export complete");
        Ok(written)
    }

    /// Collects organizations from any page source into a deduplicated set
    pub async fn harvest_crunchbase<S>(
        &self,
        source: &S,
    ) -> Result<ResultSet<CrunchbaseRecord>, HarvestError>
    where
        S: PageSource + ?Sized,
    {
        let settings = &self.config.crunchbase;
        let mut records = ResultSet::new(self.config.output.duplicates);
        let mut rejected: Option<WriteError> = None;

        let summary = paginate(
            source,
            settings.max_pages,
            Duration::from_millis(settings.request_delay_ms),
            |page| {
                for item in &page.items {
                    if let Err(e) = records.insert(extract_organization(item)) {
                        rejected = Some(e);
                        return ControlFlow::Break(());
                    }
                }
                ControlFlow::Continue(())
            },
        )
        .await?;

        if let Some(e) = rejected {
            return Err(e.into());
        }

        match &summary.stop {
            StopReason::Failed(failure) => tracing::warn!(
                page = failure.page(),
                error = %failure,
                "Walk ended early"
            ),
            stop => tracing::info!(?stop, "Walk finished"),
        }

        if records.is_empty() {
            tracing::warn!(stop = ?summary.stop, "No organizations collected");
        }

        tracing::info!(
            pages = summary.pages,
            items = summary.items,
            unique = records.len(),
            collisions = records.collisions(),
            "Crunchbase harvest summary"
        );

        Ok(records)
    }

    /// Lists company URLs from the directory blob and saves them
    pub async fn run_yc_urls(&self, max_items: Option<usize>) -> Result<Vec<Url>, HarvestError> {
        let settings = &self.config.directory;
        let urls = list_urls(&self.client, &settings.listing_url, &self.origin, max_items).await?;
        save_url_list(Path::new(&settings.url_file), &urls)?;
        Ok(urls)
    }

    /// Lists company URLs from a rendered listing and saves them
    ///
    /// The renderer is closed before returning, on success or failure.
    pub async fn run_yc_urls_rendered(
        &self,
        renderer: &mut dyn PageRenderer,
        max_items: Option<usize>,
    ) -> Result<Vec<Url>, HarvestError> {
        let settings = &self.config.directory;
        let outcome =
            list_rendered_urls(renderer, &settings.listing_url, &self.origin, max_items).await;
        let urls = close_after(renderer, outcome).await?;

        save_url_list(Path::new(&settings.url_file), &urls)?;
        Ok(urls)
    }

    /// Scrapes one company detail page, following its news endpoint
    pub async fn scrape_company(&self, url: &Url) -> Result<YcCompany, HarvestError> {
        let html = fetch_text(&self.client, url.as_str()).await?;
        let blob = parse_data_page(&html).map_err(|message| HarvestError::DirectoryBlob {
            url: url.to_string(),
            message,
        })?;

        let mut company = extract_company(&blob);

        if let Some(href) = news_url(&blob) {
            match self.fetch_news(&href).await {
                Ok(items) => {
                    let added = company.merge_news(items);
                    tracing::debug!(url = %url, added, "Merged news items");
                }
                Err(e) => tracing::warn!(url = %url, news = %href, error = %e, "News fetch failed"),
            }
        }

        Ok(company)
    }

    async fn fetch_news(&self, href: &str) -> Result<Vec<NewsItem>, HarvestError> {
        let news_url = self.origin.join(href)?;

        let body = fetch_text(&self.client, news_url.as_str()).await?;
        let payload: Value = serde_json::from_str(&body)?;
        Ok(news_items(Field::of(&payload).get("newsItems")))
    }

    /// Scrapes detail pages in order, skipping pages that fail
    pub async fn scrape_companies(&self, urls: &[Url]) -> Vec<YcCompany> {
        let delay = Duration::from_millis(self.config.directory.page_delay_ms);
        let mut companies = Vec::with_capacity(urls.len());

        for (index, url) in urls.iter().enumerate() {
            tracing::info!(url = %url, progress = index + 1, total = urls.len(), "Scraping company");

            match self.scrape_company(url).await {
                Ok(company) => companies.push(company),
                Err(e) => tracing::warn!(url = %url, error = %e, "Skipping company"),
            }

            if !delay.is_zero() && index + 1 < urls.len() {
                tokio::time::sleep(delay).await;
            }
        }

        companies
    }

    /// Scrapes every URL in the URL list and merges the results into the dump
    ///
    /// Returns the number of companies in the dump afterwards. A dump that
    /// exists but cannot be decoded is left untouched and reported as an
    /// error.
    pub async fn run_yc_scrape(&self) -> Result<usize, HarvestError> {
        let settings = &self.config.directory;
        let urls = load_url_list(Path::new(&settings.url_file))?;
        tracing::info!(count = urls.len(), path = %settings.url_file, "Loaded company URLs");

        // An unreadable dump fails the run before any page is fetched
        let dump_path = Path::new(&settings.dump_path);
        let existing: Vec<YcCompany> = load_dump(dump_path)?;

        let fresh = self.scrape_companies(&urls).await;
        let scraped = fresh.len();

        let merged = merge_dump(existing, fresh);
        save_json(dump_path, merged.records())?;

        tracing::info!(
            scraped,
            total = merged.len(),
            path = %settings.dump_path,
            "Dump updated"
        );
        Ok(merged.len())
    }

    /// Exports the dump as one CSV row per company, or one Excel row per founder
    pub fn run_yc_export(&self, excel: bool) -> Result<usize, HarvestError> {
        let settings = &self.config.directory;
        let companies: Vec<YcCompany> = read_json(Path::new(&settings.dump_path))?;
        let policy = self.config.output.duplicates;

        let written = if excel {
            let rows: Vec<FounderRow> = companies.iter().flat_map(YcCompany::founder_rows).collect();
            let rows = ResultSet::collect(rows, policy)?;
            write_excel(&rows, Path::new(&settings.excel_path))?
        } else {
            let companies = ResultSet::collect(companies, policy)?;
            write_csv(&companies, Path::new(&settings.csv_path))?
        };

        Ok(written)
    }

    /// Profile URLs to visit, honoring the configured limit
    pub fn profile_urls(&self) -> Vec<String> {
        let settings = &self.config.profiles;
        let limit = settings.limit.unwrap_or(usize::MAX);

        settings
            .slugs
            .iter()
            .take(limit)
            .map(|slug| format!("{}{}", settings.base_url, slug.trim()))
            .collect()
    }

    /// Renders and extracts every configured profile
    ///
    /// Profiles that fail to render are skipped with a warning.
    pub async fn scrape_profiles(
        &self,
        renderer: &mut dyn PageRenderer,
    ) -> Result<ResultSet<ProfileRecord>, HarvestError> {
        let urls = self.profile_urls();
        let delay = Duration::from_millis(self.config.profiles.page_delay_ms);
        let mut records = ResultSet::new(self.config.output.duplicates);

        for (index, url) in urls.iter().enumerate() {
            tracing::info!(url = %url, progress = index + 1, total = urls.len(), "Rendering profile");

            match renderer.render(url).await {
                Ok(html) => {
                    let record = extract_profile(&html);
                    if record.name.is_empty() {
                        tracing::warn!(url = %url, "Profile rendered without a name");
                    }
                    records.insert(record)?;
                }
                Err(e) => tracing::warn!(url = %url, error = %e, "Skipping profile"),
            }

            if !delay.is_zero() && index + 1 < urls.len() {
                tokio::time::sleep(delay).await;
            }
        }

        Ok(records)
    }

    /// Scrapes profiles with `renderer`, closes it, and writes the CSV
    pub async fn run_profiles(&self, renderer: &mut dyn PageRenderer) -> Result<usize, HarvestError> {
        let outcome = self.scrape_profiles(renderer).await;
        let records = close_after(renderer, outcome).await?;

        let path = &self.config.profiles.output;
        let written = write_csv(&records, Path::new(path))?;
        tracing::info!(rows = written, path = %path, "Profile export complete");
        Ok(written)
    }
}
