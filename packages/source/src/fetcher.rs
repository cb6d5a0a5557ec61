//! Paginated window fetcher.
//!
//! Materializes every record of a time window (optionally narrowed by a
//! dimension filter) by driving a [`QueryClient`] with increasing offsets:
//!
//! 1. Count the matching rows. A failed count is not fatal; the fetch then
//!    relies on short-page detection and the safety ceiling alone.
//! 2. Page sequentially with `limit = min(page_size, cap - fetched)` until
//!    a short page arrives or the cap is reached, pausing between pages.
//! 3. Retry throttled pages in place with exponential backoff.
//! 4. Stop on any other error and hand back the partial result inside the
//!    error.
//!
//! Pages must be fetched one after another: each offset depends on how many
//! rows the previous page returned.

use std::sync::Arc;
use std::time::Duration;

use nyc311_source_models::{DimensionFilter, Record, RecordField, Window};
use serde::{Deserialize, Serialize};

use crate::progress::{FetchProgress, silent};
use crate::retry::ThrottleBackoff;
use crate::soql::{OrderBy, SoqlQuery, filter_predicate, window_predicate};
use crate::{QueryClient, SourceError};

/// Tunables for [`WindowFetcher`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Records requested per page (provider maximum is 50,000).
    pub page_size: u64,
    /// Safety ceiling on records fetched for one window.
    pub safe_max: u64,
    /// Pause between successful pages, in milliseconds.
    pub page_delay_ms: u64,
    /// Initial backoff after a throttled page, in milliseconds.
    pub throttle_backoff_ms: u64,
    /// Consecutive throttles tolerated on one page before giving up.
    pub max_throttle_retries: u32,
    /// Timestamp column used for the window predicate and sort order.
    pub date_column: RecordField,
    /// Column projection. Empty selects every column.
    pub select: Vec<RecordField>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            page_size: 50_000,
            safe_max: 300_000,
            page_delay_ms: 120,
            throttle_backoff_ms: 600,
            max_throttle_retries: 5,
            date_column: RecordField::CreatedDate,
            select: RecordField::ALL.to_vec(),
        }
    }
}

impl FetcherConfig {
    fn backoff(&self) -> ThrottleBackoff {
        ThrottleBackoff::new(
            Duration::from_millis(self.throttle_backoff_ms),
            self.max_throttle_retries,
        )
    }
}

/// Records of one window plus how the fetch went.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowFetch {
    /// Records in the requested order (newest first).
    pub records: Vec<Record>,
    /// Row count reported by the provider, if the count query succeeded.
    pub total_known: Option<u64>,
    /// Whether the safety ceiling truncated the result.
    pub was_capped: bool,
    /// Successful page calls.
    pub pages: u32,
    /// Backoff waits taken after throttled pages.
    pub throttle_retries: u32,
}

/// A fetch that ended before the window was exhausted.
///
/// Both variants carry the records accumulated so far.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// A page failed with a non-retryable error.
    #[error("fetch interrupted after {} records: {source}", .partial.records.len())]
    Interrupted {
        /// Everything fetched before the failure.
        partial: Box<WindowFetch>,
        /// The terminal page error.
        source: SourceError,
    },

    /// A page stayed throttled through every allowed retry.
    #[error(
        "still rate limited after {retries} retries ({} records fetched)",
        .partial.records.len()
    )]
    ThrottleExhausted {
        /// Everything fetched before giving up.
        partial: Box<WindowFetch>,
        /// Retries spent on the failing page.
        retries: u32,
    },
}

impl FetchError {
    /// The records accumulated before the fetch stopped.
    #[must_use]
    pub fn partial(&self) -> &WindowFetch {
        match self {
            Self::Interrupted { partial, .. } | Self::ThrottleExhausted { partial, .. } => partial,
        }
    }

    /// Consumes the error, returning the partial result.
    #[must_use]
    pub fn into_partial(self) -> WindowFetch {
        match self {
            Self::Interrupted { partial, .. } | Self::ThrottleExhausted { partial, .. } => *partial,
        }
    }
}

/// Why paging stopped successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Termination {
    /// A page came back shorter than requested: end of data.
    ShortPage,
    /// The cap (known total or safety ceiling) was reached.
    Capped,
}

/// Drives a [`QueryClient`] to fetch complete windows.
pub struct WindowFetcher<C> {
    client: C,
    config: FetcherConfig,
}

impl<C: QueryClient> WindowFetcher<C> {
    /// Creates a fetcher. A zero page size is raised to one.
    #[must_use]
    pub fn new(client: C, mut config: FetcherConfig) -> Self {
        if config.page_size == 0 {
            log::warn!("page_size of 0 is not usable; using 1");
            config.page_size = 1;
        }
        Self { client, config }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// The underlying query client.
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Fetches every record in `window` matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] carrying the partial result if a page fails
    /// terminally or stays throttled past the retry limit.
    pub async fn fetch_all(
        &self,
        window: &Window,
        filter: Option<&DimensionFilter>,
    ) -> Result<WindowFetch, FetchError> {
        self.fetch_all_with_progress(window, filter, &silent())
            .await
    }

    /// Like [`fetch_all`](Self::fetch_all), reporting progress per page.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] carrying the partial result if a page fails
    /// terminally or stays throttled past the retry limit.
    pub async fn fetch_all_with_progress(
        &self,
        window: &Window,
        filter: Option<&DimensionFilter>,
        progress: &Arc<dyn FetchProgress>,
    ) -> Result<WindowFetch, FetchError> {
        let label = describe(window, filter);
        let where_clause = window_predicate(window, self.config.date_column, filter);
        let safe_max = self.config.safe_max;

        let total_known = match self.client.count(&where_clause).await {
            Ok(total) => {
                log::info!("[{label}] {total} matching records");
                Some(total)
            }
            Err(e) => {
                log::warn!("[{label}] count query failed, paging until a short page: {e}");
                None
            }
        };

        let hard_cap = total_known.map_or(safe_max, |total| total.min(safe_max));
        if total_known.is_some_and(|total| total > safe_max) {
            log::warn!("[{label}] capping fetch at {safe_max} records");
        }
        progress.begin(&label, total_known.map(|_| hard_cap));

        let fetch = WindowFetch {
            total_known,
            was_capped: total_known.is_some_and(|total| total > safe_max),
            ..WindowFetch::default()
        };
        let (mut fetch, termination) = self
            .page_through(&label, &where_clause, hard_cap, fetch, progress)
            .await?;

        if total_known.is_none() && termination == Termination::Capped {
            log::warn!("[{label}] total unknown; stopped at the {safe_max} record ceiling");
            fetch.was_capped = true;
        }

        log::info!(
            "[{label}] fetched {} records in {} pages ({termination:?})",
            fetch.records.len(),
            fetch.pages
        );
        progress.end(format!("{label}: {} records", fetch.records.len()));

        Ok(fetch)
    }

    /// Fetches the newest `limit` records matching `filter`, regardless of
    /// when they were created.
    ///
    /// No count query is issued. `limit` is clamped to the safety ceiling,
    /// and reaching it is not reported as a cap.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] carrying the partial result if a page fails
    /// terminally or stays throttled past the retry limit.
    pub async fn fetch_latest(
        &self,
        filter: &DimensionFilter,
        limit: u64,
        progress: &Arc<dyn FetchProgress>,
    ) -> Result<WindowFetch, FetchError> {
        let label = format!("latest {}={}", filter.field, filter.value);
        let where_clause = filter_predicate(filter);
        let limit = limit.min(self.config.safe_max);

        progress.begin(&label, Some(limit));

        let (fetch, termination) = self
            .page_through(&label, &where_clause, limit, WindowFetch::default(), progress)
            .await?;

        log::info!(
            "[{label}] fetched {} records in {} pages ({termination:?})",
            fetch.records.len(),
            fetch.pages
        );
        progress.end(format!("{label}: {} records", fetch.records.len()));

        Ok(fetch)
    }

    /// Pages newest-first through `where_clause` until a short page arrives
    /// or `hard_cap` records are held, appending to `fetch`.
    async fn page_through(
        &self,
        label: &str,
        where_clause: &str,
        hard_cap: u64,
        mut fetch: WindowFetch,
        progress: &Arc<dyn FetchProgress>,
    ) -> Result<(WindowFetch, Termination), FetchError> {
        let backoff = self.config.backoff();
        let page_delay = Duration::from_millis(self.config.page_delay_ms);
        let mut fetched: u64 = 0;
        let mut throttled: u32 = 0;

        let termination = loop {
            if fetched >= hard_cap {
                break Termination::Capped;
            }
            let limit = self.config.page_size.min(hard_cap - fetched);
            let query = SoqlQuery {
                select: self.config.select.clone(),
                where_clause: Some(where_clause.to_string()),
                order: OrderBy::desc(self.config.date_column),
                limit,
                offset: fetched,
            };

            match self.client.query(&query).await {
                Ok(mut batch) => {
                    throttled = 0;
                    batch.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
                    let count = batch.len() as u64;
                    fetch.records.extend(batch);
                    fetch.pages += 1;
                    fetched += count;
                    progress.page(count);

                    log::info!(
                        "[{label}] page {}: offset={}, {count}/{limit} records (total: {fetched})",
                        fetch.pages,
                        query.offset,
                    );

                    if count < limit {
                        break Termination::ShortPage;
                    }
                    if fetched >= hard_cap {
                        break Termination::Capped;
                    }
                    tokio::time::sleep(page_delay).await;
                }
                Err(e) if e.is_retryable() => {
                    if !backoff.allows(throttled) {
                        log::error!(
                            "[{label}] still throttled after {throttled} retries at offset {fetched}, giving up"
                        );
                        progress.end(format!("{label}: rate limited"));
                        return Err(FetchError::ThrottleExhausted {
                            partial: Box::new(fetch),
                            retries: throttled,
                        });
                    }
                    let delay = backoff.delay(throttled);
                    throttled += 1;
                    fetch.throttle_retries += 1;
                    log::warn!(
                        "[{label}] throttled at offset {fetched}, retry {throttled}/{} in {delay:?}",
                        backoff.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(source) => {
                    log::error!(
                        "[{label}] page fetch failed at offset {fetched} ({} records kept): {source}",
                        fetch.records.len()
                    );
                    progress.end(format!("{label}: failed"));
                    return Err(FetchError::Interrupted {
                        partial: Box::new(fetch),
                        source,
                    });
                }
            }
        };

        Ok((fetch, termination))
    }
}

fn describe(window: &Window, filter: Option<&DimensionFilter>) -> String {
    match filter {
        Some(filter) => format!("{window} {}={}", filter.field, filter.value),
        None => window.to_string(),
    }
}
