//! Fetch progress hooks.
//!
//! A fetch announces itself once, reports every page that lands, and ends
//! with a one-line outcome. The CLI draws these as `indicatif` bars; library
//! callers and tests pass [`silent`].

use std::sync::Arc;

/// Observer of a single window or lookup fetch.
///
/// Shared as `Arc<dyn FetchProgress>`, so implementations need interior
/// mutability and must be `Send + Sync`.
pub trait FetchProgress: Send + Sync {
    /// The fetch described by `label` is starting. `expected` is the number
    /// of records it will stop at, when that is known up front.
    fn begin(&self, label: &str, expected: Option<u64>);

    /// A page of `records` arrived.
    fn page(&self, records: u64);

    /// The fetch is over, successfully or not.
    fn end(&self, outcome: String);
}

/// Ignores every event.
pub struct Silent;

impl FetchProgress for Silent {
    fn begin(&self, _label: &str, _expected: Option<u64>) {}
    fn page(&self, _records: u64) {}
    fn end(&self, _outcome: String) {}
}

/// A shared [`Silent`] observer.
#[must_use]
pub fn silent() -> Arc<dyn FetchProgress> {
    Arc::new(Silent)
}
