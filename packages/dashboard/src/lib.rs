#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! View-controller layer for the NYC 311 dashboard.
//!
//! A [`controller::Dashboard`] turns a window selection into a
//! [`report::WindowReport`]: it fetches the selected window and its prior
//! window concurrently, aggregates both, and publishes the result as the
//! displayed snapshot unless a newer selection has started in the meantime.
//! It also answers one-off lookups of the newest records in a ZIP code.

pub mod config;
pub mod controller;
pub mod guard;
pub mod lookup;
pub mod report;

use nyc311_source::SourceError;
use nyc311_source::fetcher::FetchError;
use nyc311_source_models::WindowError;

pub use config::DashboardConfig;
pub use controller::{Dashboard, SelectionOutcome};

/// Errors surfaced by the dashboard layer.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// Config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for [`DashboardConfig`].
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    /// The selected window cannot be used.
    #[error(transparent)]
    Window(#[from] WindowError),

    /// The query client could not be constructed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The selected window produced no records before failing.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}
