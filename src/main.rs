//! Company-Harvest main entry point
//!
//! This is the command-line interface for the Company-Harvest pipelines.

use clap::{Parser, Subcommand};
use company_harvest::config::{load_config_with_hash, Config};
use company_harvest::crawler::{
    Coordinator, HttpRenderer, PageRenderer, ScrollPolicy, WebDriverRenderer,
};
use company_harvest::extract::READY_SELECTOR;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Readiness selector for rendered directory listings
const LISTING_READY_SELECTOR: &str = r#"a[href^="/companies/"]"#;

/// Company-Harvest: company metadata collection
///
/// Pulls company records from the Crunchbase API, the Y Combinator
/// directory and rendered Crunchbase profiles, and writes them as CSV or
/// Excel files.
#[derive(Parser, Debug)]
#[command(name = "company-harvest")]
#[command(version = "1.0.0")]
#[command(about = "Company metadata collection", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the configuration and show what each pipeline would do
    Check,

    /// Walk the Crunchbase API and write the organizations CSV
    Crunchbase,

    /// List YC company URLs and save them to the URL file
    YcUrls {
        /// Stop after this many companies
        #[arg(long)]
        max: Option<usize>,

        /// Read the listing through a WebDriver browser session
        #[arg(long)]
        rendered: bool,
    },

    /// Scrape every URL in the URL file and merge into the JSON dump
    YcScrape,

    /// Export the JSON dump as CSV, or as a per-founder Excel sheet
    YcExport {
        /// Write the Excel workbook instead of the CSV
        #[arg(long)]
        excel: bool,
    },

    /// Render Crunchbase profiles and write the profiles CSV
    Profiles {
        /// Fetch pages over plain HTTP instead of WebDriver
        #[arg(long)]
        http: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    cfg
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if let Command::Check = cli.command {
        handle_check(&config);
        return Ok(());
    }

    let coordinator = Coordinator::new(config)?;

    let outcome = match cli.command {
        Command::Check => Ok(()),
        Command::Crunchbase => handle_crunchbase(&coordinator).await,
        Command::YcUrls { max, rendered } => handle_yc_urls(&coordinator, max, rendered).await,
        Command::YcScrape => handle_yc_scrape(&coordinator).await,
        Command::YcExport { excel } => handle_yc_export(&coordinator, excel),
        Command::Profiles { http } => handle_profiles(&coordinator, http).await,
    };

    if let Err(e) = &outcome {
        tracing::error!("Harvest failed: {}", e);
    }
    outcome
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("company_harvest=info,warn"),
            1 => EnvFilter::new("company_harvest=debug,info"),
            2 => EnvFilter::new("company_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles `check`: prints the effective configuration
fn handle_check(config: &Config) {
    println!("=== Company-Harvest Configuration ===\n");

    println!("HTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!("  Timeout: {}s", config.http.timeout_secs);

    let cb = &config.crunchbase;
    println!("\nCrunchbase API:");
    println!("  Endpoint: {}", cb.base_url);
    println!("  API key variable: {}", cb.api_key_env);
    println!("  Page size: {} (max {} pages)", cb.page_size, cb.max_pages);
    println!("  Request delay: {}ms", cb.request_delay_ms);
    println!(
        "  Rate-limit cooldown: {}ms doubling up to {}ms, {} retries",
        cb.cooldown_ms, cb.max_cooldown_ms, cb.max_retries
    );
    println!("  Output: {}", cb.output);

    let dir = &config.directory;
    println!("\nYC directory:");
    println!("  Listing: {}", dir.listing_url);
    println!("  URL file: {}", dir.url_file);
    println!("  Dump: {}", dir.dump_path);
    println!("  CSV: {}", dir.csv_path);
    println!("  Excel: {}", dir.excel_path);
    println!(
        "  Rendered listing: up to {} scrolls, {}ms settle",
        dir.max_scroll_rounds, dir.scroll_settle_ms
    );

    let profiles = &config.profiles;
    println!("\nCrunchbase profiles ({} slugs):", profiles.slugs.len());
    println!("  WebDriver: {}", profiles.webdriver_url);
    println!(
        "  Scrolling: up to {} scrolls, {}ms settle",
        profiles.max_scroll_rounds, profiles.scroll_settle_ms
    );
    if let Some(limit) = profiles.limit {
        println!("  Limit: {}", limit);
    }
    println!("  Output: {}", profiles.output);

    println!("\nDuplicate policy: {:?}", config.output.duplicates);
    println!("\n✓ Configuration is valid");
}

async fn handle_crunchbase(coordinator: &Coordinator) -> Result<(), Box<dyn std::error::Error>> {
    let rows = coordinator.run_crunchbase().await?;
    println!(
        "✓ {} organizations written to {}",
        rows,
        coordinator.config().crunchbase.output
    );
    Ok(())
}

async fn handle_yc_urls(
    coordinator: &Coordinator,
    max: Option<usize>,
    rendered: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let urls = if rendered {
        let directory = &coordinator.config().directory;
        let scroll = ScrollPolicy::new(directory.scroll_settle_ms, directory.max_scroll_rounds);
        let mut renderer = connect_webdriver(coordinator, LISTING_READY_SELECTOR, scroll).await?;
        coordinator.run_yc_urls_rendered(&mut renderer, max).await?
    } else {
        coordinator.run_yc_urls(max).await?
    };

    println!(
        "✓ {} company URLs saved to {}",
        urls.len(),
        coordinator.config().directory.url_file
    );
    Ok(())
}

async fn handle_yc_scrape(coordinator: &Coordinator) -> Result<(), Box<dyn std::error::Error>> {
    let total = coordinator.run_yc_scrape().await?;
    println!(
        "✓ {} companies in {}",
        total,
        coordinator.config().directory.dump_path
    );
    Ok(())
}

fn handle_yc_export(coordinator: &Coordinator, excel: bool) -> Result<(), Box<dyn std::error::Error>> {
    let rows = coordinator.run_yc_export(excel)?;
    let directory = &coordinator.config().directory;
    let path = if excel {
        &directory.excel_path
    } else {
        &directory.csv_path
    };
    println!("✓ {} rows written to {}", rows, path);
    Ok(())
}

async fn handle_profiles(
    coordinator: &Coordinator,
    http: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut renderer: Box<dyn PageRenderer> = if http {
        Box::new(HttpRenderer::new(coordinator.client().clone()))
    } else {
        let profiles = &coordinator.config().profiles;
        let scroll = ScrollPolicy::new(profiles.scroll_settle_ms, profiles.max_scroll_rounds);
        Box::new(connect_webdriver(coordinator, READY_SELECTOR, scroll).await?)
    };

    let rows = coordinator.run_profiles(renderer.as_mut()).await?;
    println!(
        "✓ {} profiles written to {}",
        rows,
        coordinator.config().profiles.output
    );
    Ok(())
}

async fn connect_webdriver(
    coordinator: &Coordinator,
    ready_selector: &str,
    scroll: ScrollPolicy,
) -> Result<WebDriverRenderer, Box<dyn std::error::Error>> {
    let profiles = &coordinator.config().profiles;
    let renderer = WebDriverRenderer::connect(
        &profiles.webdriver_url,
        ready_selector,
        Duration::from_secs(profiles.wait_timeout_secs),
        scroll,
    )
    .await?;
    Ok(renderer)
}
