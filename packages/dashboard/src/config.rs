//! Dashboard configuration.
//!
//! Loaded from an optional TOML file; every field has a default, so an
//! empty file (or no file) yields a working configuration:
//!
//! ```toml
//! default_days = 7
//! top_n = 10
//! zip_limit = 500
//!
//! [client]
//! app_token = "..."
//!
//! [fetcher]
//! page_size = 50000
//! safe_max = 300000
//!
//! [risers]
//! threshold = 10
//! limit = 5
//! ```

use std::path::Path;

use nyc311_analytics_models::RiserOptions;
use nyc311_source::fetcher::FetcherConfig;
use nyc311_source::socrata::ClientConfig;
use serde::{Deserialize, Serialize};

use crate::DashboardError;

/// Everything a [`Dashboard`](crate::Dashboard) needs besides a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Provider connection settings.
    pub client: ClientConfig,
    /// Pagination and backoff settings.
    pub fetcher: FetcherConfig,
    /// Fastest-risers qualification.
    pub risers: RiserOptions,
    /// Rows kept in each ranked list of a report.
    pub top_n: usize,
    /// Trailing days covered when no explicit range is selected.
    pub default_days: u32,
    /// Records fetched by a ZIP lookup when no limit is given.
    pub zip_limit: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            fetcher: FetcherConfig::default(),
            risers: RiserOptions::default(),
            top_n: 10,
            default_days: 7,
            zip_limit: 500,
        }
    }
}

impl DashboardConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Toml`] if the document is malformed.
    pub fn from_toml(toml_str: &str) -> Result<Self, DashboardError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Reads and parses the TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Io`] if the file cannot be read, or
    /// [`DashboardError::Toml`] if it is malformed.
    pub fn load(path: &Path) -> Result<Self, DashboardError> {
        log::debug!("Loading config from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Replaces the configured app token when `token` is non-empty.
    #[must_use]
    pub fn with_app_token(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.client.app_token = Some(token);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use nyc311_source_models::RecordField;

    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = DashboardConfig::from_toml("").unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.fetcher.page_size, 50_000);
        assert_eq!(config.fetcher.safe_max, 300_000);
        assert_eq!(config.risers.threshold, 10);
        assert_eq!(config.risers.limit, 5);
        assert_eq!(config.client.app_token, None);
        assert_eq!(config.zip_limit, 500);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = DashboardConfig::from_toml(
            r#"
            top_n = 3

            [client]
            app_token = "abc"

            [fetcher]
            page_size = 1000
            select = ["unique_key", "created_date", "borough"]

            [risers]
            threshold = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.top_n, 3);
        assert_eq!(config.default_days, 7);
        assert_eq!(config.client.app_token.as_deref(), Some("abc"));
        assert_eq!(config.fetcher.page_size, 1000);
        assert_eq!(config.fetcher.page_delay_ms, 120);
        assert_eq!(
            config.fetcher.select,
            vec![
                RecordField::UniqueKey,
                RecordField::CreatedDate,
                RecordField::Borough
            ]
        );
        assert_eq!(config.risers.threshold, 2);
        assert_eq!(config.risers.limit, 5);
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            DashboardConfig::from_toml("top_n = \"many\"").unwrap_err(),
            DashboardError::Toml(_)
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            DashboardConfig::load(Path::new("/nonexistent/nyc311.toml")).unwrap_err(),
            DashboardError::Io(_)
        ));
    }

    #[test]
    fn env_token_overrides_file_token() {
        let config = DashboardConfig::from_toml("[client]\napp_token = \"file\"").unwrap();
        let config = config.with_app_token(Some("env".to_string()));
        assert_eq!(config.client.app_token.as_deref(), Some("env"));

        let config = config.with_app_token(Some("  ".to_string()));
        assert_eq!(config.client.app_token.as_deref(), Some("env"));
    }
}
