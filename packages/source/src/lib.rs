#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Remote query client and paginated window fetcher for NYC 311 records.
//!
//! The [`QueryClient`] trait issues one filtered, sorted, paginated query
//! against the provider. [`fetcher::WindowFetcher`] drives a client page by
//! page until a time window is fully materialized, backing off on rate
//! limits and stopping at a configured safety ceiling.

pub mod fetcher;
pub mod progress;
pub mod retry;
pub mod soql;
pub mod socrata;

use async_trait::async_trait;
use nyc311_source_models::Record;

use crate::soql::SoqlQuery;

/// Errors that can occur talking to the record provider.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The provider rate-limited the request (HTTP 429). Retryable.
    #[error("rate limited by provider (HTTP 429)")]
    Throttled,

    /// Any other non-success HTTP status. Terminal.
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Leading portion of the response body.
        body: String,
    },

    /// The count response did not contain a usable count.
    #[error("count query failed: {message}")]
    Count {
        /// Description of what went wrong.
        message: String,
    },

    /// Client configuration was rejected (e.g. a malformed app token).
    #[error("invalid client configuration: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}

impl SourceError {
    /// Whether the failed call may be retried unchanged after a backoff.
    ///
    /// Only throttling is retryable; every other failure is terminal for
    /// the current page.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Throttled)
    }
}

/// A single-call interface to a paginated record provider.
///
/// Implementations perform exactly one network round trip per call and do
/// not retry; retry policy belongs to the caller.
#[async_trait]
pub trait QueryClient: Send + Sync {
    /// Runs one page query.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Throttled`] on HTTP 429 and another
    /// [`SourceError`] variant for any terminal failure.
    async fn query(&self, query: &SoqlQuery) -> Result<Vec<Record>, SourceError>;

    /// Counts the rows matching a SoQL `$where` predicate.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request fails or the response carries
    /// no parseable count.
    async fn count(&self, where_clause: &str) -> Result<u64, SourceError>;
}
