use std::net::IpAddr;

use url::Url;

use crate::config::types::{ProjectConfig, Settings};
use crate::crawler::LinkFilter;
use crate::extract::builtin;
use crate::ConfigError;

/// Validates a whole project
pub fn validate(project: &ProjectConfig) -> Result<(), ConfigError> {
    validate_start_url(&project.start_url)?;
    validate_settings(&project.settings)?;
    validate_selectors(project)?;
    Ok(())
}

/// Validates crawler settings
pub fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    // max_depth >= 0 is always true for u32, so no check needed

    if settings.max_concurrency < 1 {
        return Err(ConfigError::Validation(format!(
            "max_concurrency must be >= 1, got {}",
            settings.max_concurrency
        )));
    }

    if !settings.request_timeout.is_finite() || settings.request_timeout <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "request_timeout must be a positive number of seconds, got {}",
            settings.request_timeout
        )));
    }

    if !settings.download_delay.is_finite() || settings.download_delay < 0.0 {
        return Err(ConfigError::Validation(format!(
            "download_delay must be >= 0 seconds, got {}",
            settings.download_delay
        )));
    }

    if settings.language.trim().is_empty() {
        return Err(ConfigError::Validation(
            "language cannot be empty".to_string(),
        ));
    }

    if let LinkFilter::Query(query) = &settings.link_filter {
        if query.trim().is_empty() {
            return Err(ConfigError::Validation(
                "link_filter cannot be empty".to_string(),
            ));
        }
    }

    for provider in &settings.dns_providers {
        provider.parse::<IpAddr>().map_err(|_| {
            ConfigError::Validation(format!(
                "dns_providers must be IP addresses, got '{}'",
                provider
            ))
        })?;
    }

    if settings.export_to.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "export_to cannot be empty".to_string(),
        ));
    }

    if settings.cache_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "cache_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates a start URL: it needs a scheme and a host
pub fn validate_start_url(start_url: &str) -> Result<(), ConfigError> {
    let url = Url::parse(start_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", start_url, e)))?;

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::InvalidUrl(format!(
            "'{}' has no host",
            start_url
        )));
    }

    Ok(())
}

fn validate_selectors(project: &ProjectConfig) -> Result<(), ConfigError> {
    for (field, query) in &project.selectors {
        if query.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Selector '{}' cannot be empty",
                field
            )));
        }

        if let Some(name) = query.strip_prefix(builtin::PREFIX) {
            if builtin::by_name(name).is_none() {
                return Err(ConfigError::Validation(format!(
                    "Selector '{}' names unknown built-in '{}', expected one of: {}",
                    field,
                    name,
                    builtin::NAMES.join(", ")
                )));
            }
        }
    }

    Ok(())
}
