//! Socrata SODA API client.
//!
//! Implements [`QueryClient`] over `reqwest` for the NYC Open Data 311
//! dataset (or any Socrata dataset with the same column names). Each call
//! is a single GET; HTTP 429 is surfaced as [`SourceError::Throttled`] so
//! the caller can back off and retry.

use std::time::Duration;

use async_trait::async_trait;
use nyc311_source_models::Record;
use serde::{Deserialize, Serialize};

use crate::soql::SoqlQuery;
use crate::{QueryClient, SourceError};

/// NYC 311 Service Requests from 2010 to Present.
pub const DEFAULT_API_URL: &str = "https://data.cityofnewyork.us/resource/erm2-nwe9.json";

/// Header carrying the Socrata application token.
pub const APP_TOKEN_HEADER: &str = "X-App-Token";

/// Maximum length of the response body preview kept in errors.
const BODY_PREVIEW_LEN: usize = 500;

/// Connection settings for [`SocrataClient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Dataset resource URL (ending in `.json`).
    pub api_url: String,
    /// Optional application token. Without one, requests share the
    /// anonymous rate-limit pool.
    pub app_token: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            app_token: None,
            timeout_secs: 120,
        }
    }
}

/// A [`QueryClient`] backed by the Socrata SODA HTTP API.
#[derive(Debug, Clone)]
pub struct SocrataClient {
    client: reqwest::Client,
    api_url: String,
}

impl SocrataClient {
    /// Builds a client, installing the app token as a default header.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Config`] if the token is not a valid header
    /// value, or [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, SourceError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        if let Some(token) = config.app_token.as_deref().filter(|t| !t.is_empty()) {
            let value = reqwest::header::HeaderValue::from_str(token).map_err(|e| {
                SourceError::Config {
                    message: format!("invalid app token: {e}"),
                }
            })?;
            headers.insert(APP_TOKEN_HEADER, value);
        } else {
            log::debug!("No app token configured; using anonymous rate limits");
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
        })
    }

    /// Sends one GET and returns the body text of a successful response.
    async fn get(&self, params: &[(&str, String)]) -> Result<String, SourceError> {
        let response = self.client.get(&self.api_url).query(params).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::Throttled);
        }

        let text = response.text().await?;
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                body: preview(&text),
            });
        }
        Ok(text)
    }
}

#[async_trait]
impl QueryClient for SocrataClient {
    async fn query(&self, query: &SoqlQuery) -> Result<Vec<Record>, SourceError> {
        log::debug!(
            "GET {} offset={} limit={}",
            self.api_url,
            query.offset,
            query.limit
        );
        let body = self.get(&query.to_params()).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn count(&self, where_clause: &str) -> Result<u64, SourceError> {
        let params = [
            ("$select", "count(1) AS count".to_string()),
            ("$where", where_clause.to_string()),
        ];
        let body = self.get(&params).await?;
        parse_count(&body)
    }
}

/// Extracts the row count from a `SELECT count(1)` response.
///
/// Socrata names the column `count` or `count_1` depending on the query
/// form and may encode it as a string or a number.
///
/// # Errors
///
/// Returns [`SourceError::Json`] if the body is not JSON, or
/// [`SourceError::Count`] if no count column can be read.
pub fn parse_count(body: &str) -> Result<u64, SourceError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let row = value.get(0).ok_or_else(|| SourceError::Count {
        message: "empty count response".to_string(),
    })?;
    let cell = row
        .get("count")
        .or_else(|| row.get("count_1"))
        .ok_or_else(|| SourceError::Count {
            message: format!("no count column in {row}"),
        })?;
    cell.as_u64()
        .or_else(|| cell.as_str()?.trim().parse::<u64>().ok())
        .ok_or_else(|| SourceError::Count {
            message: format!("unparseable count {cell}"),
        })
}

fn preview(text: &str) -> String {
    if text.chars().count() > BODY_PREVIEW_LEN {
        let head: String = text.chars().take(BODY_PREVIEW_LEN).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_string_count() {
        assert_eq!(parse_count(r#"[{"count":"123456"}]"#).unwrap(), 123_456);
    }

    #[test]
    fn parses_numeric_count_alias() {
        assert_eq!(parse_count(r#"[{"count_1":42}]"#).unwrap(), 42);
    }

    #[test]
    fn rejects_missing_count() {
        assert!(matches!(
            parse_count("[]").unwrap_err(),
            SourceError::Count { .. }
        ));
        assert!(matches!(
            parse_count(r#"[{"total":"5"}]"#).unwrap_err(),
            SourceError::Count { .. }
        ));
        assert!(matches!(
            parse_count(r#"[{"count":"lots"}]"#).unwrap_err(),
            SourceError::Count { .. }
        ));
    }

    #[test]
    fn rejects_non_json_count() {
        assert!(matches!(
            parse_count("<html>").unwrap_err(),
            SourceError::Json(_)
        ));
    }

    #[test]
    fn truncates_long_bodies() {
        let body = "x".repeat(BODY_PREVIEW_LEN + 10);
        let p = preview(&body);
        assert!(p.ends_with("..."));
        assert_eq!(p.len(), BODY_PREVIEW_LEN + 3);
    }

    #[test]
    fn builds_with_and_without_token() {
        assert!(SocrataClient::new(&ClientConfig::default()).is_ok());
        let config = ClientConfig {
            app_token: Some("abc123".to_string()),
            ..ClientConfig::default()
        };
        assert!(SocrataClient::new(&config).is_ok());
    }

    #[test]
    fn rejects_token_with_control_characters() {
        let config = ClientConfig {
            app_token: Some("bad\ntoken".to_string()),
            ..ClientConfig::default()
        };
        assert!(matches!(
            SocrataClient::new(&config).unwrap_err(),
            SourceError::Config { .. }
        ));
    }

    #[test]
    fn only_throttling_is_retryable() {
        assert!(SourceError::Throttled.is_retryable());
        assert!(
            !SourceError::Status {
                status: 500,
                body: String::new(),
            }
            .is_retryable()
        );
    }
}
