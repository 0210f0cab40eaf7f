use crate::output::DuplicatePolicy;
use serde::Deserialize;

/// Main configuration structure for Company-Harvest
///
/// Every section is optional; missing sections and keys fall back to the
/// defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub crunchbase: CrunchbaseConfig,
    pub directory: DirectoryConfig,
    pub profiles: ProfilesConfig,
    pub output: OutputConfig,
}

/// Shared HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Overall request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (compatible; DataExtractionBot/1.0)".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Crunchbase REST API pagination configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrunchbaseConfig {
    /// Organizations collection endpoint
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Name of the environment variable holding the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Items requested per page (`limit` query parameter)
    #[serde(rename = "page-size")]
    pub page_size: u32,

    /// Safety ceiling on the number of pages walked
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Pause after every successful page (milliseconds)
    #[serde(rename = "request-delay-ms")]
    pub request_delay_ms: u64,

    /// First cooldown after a 429 response (milliseconds)
    #[serde(rename = "cooldown-ms")]
    pub cooldown_ms: u64,

    /// Upper bound for the exponential cooldown (milliseconds)
    #[serde(rename = "max-cooldown-ms")]
    pub max_cooldown_ms: u64,

    /// Rate-limit retries per page before giving up
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// CSV output path
    pub output: String,
}

impl Default for CrunchbaseConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.crunchbase.com/v4/data/entities/organizations".to_string(),
            api_key_env: "CRUNCHBASE_API_KEY".to_string(),
            page_size: 100,
            max_pages: 10_000,
            request_delay_ms: 300,
            cooldown_ms: 60_000,
            max_cooldown_ms: 600_000,
            max_retries: 5,
            output: "crunchbase_companies_selected_columns.csv".to_string(),
        }
    }
}

/// Y Combinator directory crawl configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Origin used to resolve root-relative links
    pub origin: String,

    /// Listing page carrying the embedded company list
    #[serde(rename = "listing-url")]
    pub listing_url: String,

    /// JSON array of detail-page URLs consumed by the detail scrape
    #[serde(rename = "url-file")]
    pub url_file: String,

    /// JSON dump of scraped companies, merged across runs by website
    #[serde(rename = "dump-path")]
    pub dump_path: String,

    /// Pause between detail pages (milliseconds)
    #[serde(rename = "page-delay-ms")]
    pub page_delay_ms: u64,

    /// CSV export path
    #[serde(rename = "csv-path")]
    pub csv_path: String,

    /// Excel export path
    #[serde(rename = "excel-path")]
    pub excel_path: String,

    /// Wait after each scroll of a rendered listing (milliseconds)
    #[serde(rename = "scroll-settle-ms")]
    pub scroll_settle_ms: u64,

    /// Scroll steps before a rendered listing is read, stopping early once
    /// it stops growing
    #[serde(rename = "max-scroll-rounds")]
    pub max_scroll_rounds: u32,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            origin: "https://www.ycombinator.com".to_string(),
            listing_url: "https://www.ycombinator.com/companies".to_string(),
            url_file: "filtered_company_urls.json".to_string(),
            dump_path: "yc_companies_data.json".to_string(),
            page_delay_ms: 1000,
            csv_path: "yc_companies_data.csv".to_string(),
            excel_path: "yc_companies_filtered.xlsx".to_string(),
            scroll_settle_ms: 1500,
            max_scroll_rounds: 200,
        }
    }
}

/// Rendered Crunchbase profile scrape configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProfilesConfig {
    /// Prefix joined with each organization slug
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Organization slugs to visit
    pub slugs: Vec<String>,

    /// Maximum number of slugs visited per run
    pub limit: Option<usize>,

    /// WebDriver server endpoint
    #[serde(rename = "webdriver-url")]
    pub webdriver_url: String,

    /// How long to wait for the profile heading (seconds)
    #[serde(rename = "wait-timeout-secs")]
    pub wait_timeout_secs: u64,

    /// Pause between profiles (milliseconds)
    #[serde(rename = "page-delay-ms")]
    pub page_delay_ms: u64,

    /// Wait after scrolling a profile for lazy sections (milliseconds)
    #[serde(rename = "scroll-settle-ms")]
    pub scroll_settle_ms: u64,

    /// Scroll steps per profile
    #[serde(rename = "max-scroll-rounds")]
    pub max_scroll_rounds: u32,

    /// CSV output path
    pub output: String,
}

impl Default for ProfilesConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.crunchbase.com/organization/".to_string(),
            slugs: Vec::new(),
            limit: None,
            webdriver_url: "http://localhost:4444".to_string(),
            wait_timeout_secs: 15,
            page_delay_ms: 5000,
            scroll_settle_ms: 3000,
            max_scroll_rounds: 3,
            output: "crunchbase_data.csv".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Natural-key collision policy applied before writing
    pub duplicates: DuplicatePolicy,
}
