//! Application configuration loaded from environment variables.
//!
//! All settings have workable defaults for a desktop install; environment
//! variables (or a `.env` file) override them for development.

use std::env;
use std::path::PathBuf;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the rides site (API and receipt endpoints hang off it)
    pub api_base_url: String,
    /// Root directory of the on-disk cache
    pub cache_root: PathBuf,
    /// Directory where reports and merged receipts are written
    pub output_dir: PathBuf,
    /// Optional persisted report configuration (JSON)
    pub report_config_path: Option<PathBuf>,
    /// Optional cookie export file (JSON map of name -> value)
    pub cookies_path: Option<PathBuf>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            api_base_url: "https://riders.uber.com".to_string(),
            cache_root: PathBuf::from("/tmp/ride-reporter-cache"),
            output_dir: PathBuf::from("/tmp"),
            report_config_path: None,
            cookies_path: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let cache_root = match env::var("RIDE_REPORTER_CACHE_ROOT") {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_cache_root()?,
        };

        Ok(Self {
            api_base_url: env::var("RIDE_REPORTER_API_BASE_URL")
                .unwrap_or_else(|_| "https://riders.uber.com".to_string()),
            cache_root,
            output_dir: env::var("RIDE_REPORTER_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            report_config_path: env::var("RIDE_REPORTER_REPORT_CONFIG")
                .ok()
                .map(PathBuf::from),
            cookies_path: env::var("RIDE_REPORTER_COOKIES_FILE").ok().map(PathBuf::from),
        })
    }
}

/// Default cache root under the user's home directory.
fn default_cache_root() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(".ride-reporter-cache"))
        .ok_or(ConfigError::Missing("HOME"))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("RIDE_REPORTER_CACHE_ROOT", "/tmp/rr-test-cache");
        env::set_var("RIDE_REPORTER_OUTPUT_DIR", "/tmp/rr-test-out");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.api_base_url, "https://riders.uber.com");
        assert_eq!(config.cache_root, PathBuf::from("/tmp/rr-test-cache"));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/rr-test-out"));
    }
}
