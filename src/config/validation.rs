use crate::config::types::{Config, CrawlerConfig, OutputConfig, ScannerConfig, ServerConfig};
use crate::ConfigError;

/// Upper bound on the worker pool; the crawl is meant to stay small
const MAX_WORKERS: usize = 16;

/// The first read must at least hold a status line and a few headers
const MIN_READ_CHUNK: usize = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_server_config(&config.server)?;
    validate_crawler_config(&config.crawler)?;
    validate_scanner_config(&config.scanner)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    if config.host.trim().is_empty() {
        return Err(ConfigError::Validation("host cannot be empty".to_string()));
    }

    if config.port == 0 {
        return Err(ConfigError::Validation("port must be non-zero".to_string()));
    }

    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if config.target_flags < 1 {
        return Err(ConfigError::Validation(
            "target-flags must be >= 1".to_string(),
        ));
    }

    if config.read_chunk_size < MIN_READ_CHUNK {
        return Err(ConfigError::Validation(format!(
            "read-chunk-size must be >= {}, got {}",
            MIN_READ_CHUNK, config.read_chunk_size
        )));
    }

    validate_path("start-path", &config.start_path)?;
    validate_path("login-path", &config.login_path)?;

    if config.progress_interval < 1 {
        return Err(ConfigError::Validation(
            "progress-interval must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_scanner_config(config: &ScannerConfig) -> Result<(), ConfigError> {
    validate_path("profile-prefix", &config.profile_prefix)?;

    if config.marker_tag.is_empty() || config.marker_class.is_empty() {
        return Err(ConfigError::Validation(
            "marker-tag and marker-class cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.flags_path.is_empty() {
        return Err(ConfigError::Validation(
            "flags-path cannot be empty".to_string(),
        ));
    }

    if matches!(config.summary_path.as_deref(), Some("")) {
        return Err(ConfigError::Validation(
            "summary-path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_path(field: &str, path: &str) -> Result<(), ConfigError> {
    if !path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "{} must start with '/', got '{}'",
            field, path
        )));
    }
    Ok(())
}
