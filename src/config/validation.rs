use crate::config::types::{
    Config, CrunchbaseConfig, DirectoryConfig, HttpConfig, ProfilesConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_http_config(&config.http)?;
    validate_crunchbase_config(&config.crunchbase)?;
    validate_directory_config(&config.directory)?;
    validate_profiles_config(&config.profiles)?;
    Ok(())
}

/// Validates shared HTTP settings
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "[http] user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "[http] timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates Crunchbase pagination settings
fn validate_crunchbase_config(config: &CrunchbaseConfig) -> Result<(), ConfigError> {
    validate_http_url("[crunchbase] base-url", &config.base_url)?;

    if config.api_key_env.trim().is_empty() {
        return Err(ConfigError::Validation(
            "[crunchbase] api-key-env cannot be empty".to_string(),
        ));
    }

    if config.page_size < 1 || config.page_size > 1000 {
        return Err(ConfigError::Validation(format!(
            "[crunchbase] page-size must be between 1 and 1000, got {}",
            config.page_size
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "[crunchbase] max-pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.max_cooldown_ms < config.cooldown_ms {
        return Err(ConfigError::Validation(format!(
            "[crunchbase] max-cooldown-ms ({}) must be >= cooldown-ms ({})",
            config.max_cooldown_ms, config.cooldown_ms
        )));
    }

    validate_path("[crunchbase] output", &config.output)?;

    Ok(())
}

/// Validates directory crawl settings
fn validate_directory_config(config: &DirectoryConfig) -> Result<(), ConfigError> {
    let origin = validate_http_url("[directory] origin", &config.origin)?;
    if origin.path() != "/" {
        return Err(ConfigError::Validation(format!(
            "[directory] origin must not carry a path, got '{}'",
            config.origin
        )));
    }

    validate_http_url("[directory] listing-url", &config.listing_url)?;
    validate_path("[directory] url-file", &config.url_file)?;
    validate_path("[directory] dump-path", &config.dump_path)?;
    validate_path("[directory] csv-path", &config.csv_path)?;
    validate_path("[directory] excel-path", &config.excel_path)?;

    Ok(())
}

/// Validates rendered profile settings
fn validate_profiles_config(config: &ProfilesConfig) -> Result<(), ConfigError> {
    validate_http_url("[profiles] base-url", &config.base_url)?;
    validate_http_url("[profiles] webdriver-url", &config.webdriver_url)?;
    validate_path("[profiles] output", &config.output)?;

    if let Some(slug) = config.slugs.iter().find(|s| s.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "[profiles] slugs cannot contain blank entries, got '{}'",
            slug
        )));
    }

    if config.limit == Some(0) {
        return Err(ConfigError::Validation(
            "[profiles] limit must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Parses `value` and requires an http(s) scheme
fn validate_http_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", field, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            field, value
        )));
    }

    Ok(url)
}

fn validate_path(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}
