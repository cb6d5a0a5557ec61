//! Window selection and publication.
//!
//! Each selection fetches its window and the prior window concurrently,
//! builds a [`WindowReport`], and publishes it as the displayed snapshot
//! only if no newer selection has begun. Superseded results are dropped.
//! ZIP lookups and borough summaries are one-off reads that leave the
//! displayed snapshot alone.

use std::sync::{Arc, Mutex, PoisonError};

use futures::future::join_all;
use nyc311_analytics::{count_by, delta_pct, hour_label, hourly_histogram, peak_hour, percent};
use nyc311_source::QueryClient;
use nyc311_source::fetcher::{FetchError, WindowFetch, WindowFetcher};
use nyc311_source::progress::{FetchProgress, silent};
use nyc311_source::socrata::SocrataClient;
use nyc311_source_models::{Borough, DimensionFilter, RecordField, Window, ZipCode};
use serde::{Deserialize, Serialize};

use crate::guard::SelectionGuard;
use crate::lookup::{self, ZipReport};
use crate::report::{self, ReportOptions, WindowData, WindowReport};
use crate::{DashboardConfig, DashboardError};

/// Creates a progress reporter for a labelled fetch.
pub type ProgressFactory = Arc<dyn Fn(&str) -> Arc<dyn FetchProgress> + Send + Sync>;

/// Result of a selection.
#[derive(Debug, Clone)]
pub enum SelectionOutcome {
    /// The report was published as the displayed snapshot.
    Applied(Arc<WindowReport>),
    /// A newer selection began before this one finished; its data was
    /// discarded.
    Superseded,
}

/// Totals for one borough over a window and its prior window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoroughSummary {
    /// Borough.
    pub borough: Borough,
    /// Records in the current window.
    pub total: u64,
    /// Records in the prior window.
    pub prior_total: u64,
    /// Change in total from prior to current.
    pub delta_pct: f64,
    /// Percentage of the five boroughs' combined current total.
    pub share: f64,
    /// Most common complaint type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_complaint: Option<String>,
    /// Busiest hour of the day.
    pub peak_hour_label: String,
    /// Whether either fetch hit the safety ceiling.
    pub was_capped: bool,
    /// Why a fetch stopped early, if one did.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// One borough's summary, or why it could not be produced.
pub type BoroughResult = (Borough, Result<BoroughSummary, DashboardError>);

/// Drives fetches for window selections and holds the displayed report.
pub struct Dashboard<C> {
    fetcher: WindowFetcher<C>,
    options: ReportOptions,
    zip_limit: u64,
    guard: SelectionGuard,
    displayed: Mutex<Option<Arc<WindowReport>>>,
    progress: ProgressFactory,
}

impl Dashboard<SocrataClient> {
    /// Builds a dashboard backed by the Socrata HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Source`] if the HTTP client cannot be
    /// built from `config.client`.
    pub fn connect(config: &DashboardConfig) -> Result<Self, DashboardError> {
        let client = SocrataClient::new(&config.client)?;
        Ok(Self::new(client, config))
    }
}

impl<C: QueryClient> Dashboard<C> {
    /// Builds a dashboard over any query client.
    #[must_use]
    pub fn new(client: C, config: &DashboardConfig) -> Self {
        Self {
            fetcher: WindowFetcher::new(client, config.fetcher.clone()),
            options: ReportOptions {
                top_n: config.top_n,
                risers: config.risers,
            },
            zip_limit: config.zip_limit,
            guard: SelectionGuard::new(),
            displayed: Mutex::new(None),
            progress: Arc::new(|_: &str| silent()),
        }
    }

    /// Reports fetch progress through reporters made by `factory`.
    #[must_use]
    pub fn with_progress(mut self, factory: ProgressFactory) -> Self {
        self.progress = factory;
        self
    }

    /// The underlying fetcher.
    #[must_use]
    pub const fn fetcher(&self) -> &WindowFetcher<C> {
        &self.fetcher
    }

    /// The most recently published report, if any.
    #[must_use]
    pub fn displayed(&self) -> Option<Arc<WindowReport>> {
        self.displayed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Selects `window` (optionally filtered) and publishes its report.
    ///
    /// Returns [`SelectionOutcome::Superseded`] if another selection began
    /// while this one was fetching. A fetch that fails part way still
    /// produces a report, flagged as partial.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Window`] if the prior window cannot be
    /// derived, or [`DashboardError::Fetch`] if the current window failed
    /// before yielding any records.
    pub async fn select(
        &self,
        window: Window,
        filter: Option<DimensionFilter>,
    ) -> Result<SelectionOutcome, DashboardError> {
        let ticket = self.guard.begin();
        let prior_window = window.prior()?;
        log::info!(
            "Selection #{}: {window} vs {prior_window}",
            ticket.generation()
        );

        let (current, prior) = tokio::join!(
            self.fetch("current", &window, filter.as_ref()),
            self.fetch("prior", &prior_window, filter.as_ref()),
        );

        if !self.guard.is_current(ticket) {
            log::debug!("Selection #{} superseded", ticket.generation());
            return Ok(SelectionOutcome::Superseded);
        }

        let (current, current_error) = settle(current)?;
        let (prior, prior_error) = match settle(prior) {
            Ok(settled) => settled,
            Err(e) => (WindowFetch::default(), Some(e.to_string())),
        };

        let report = Arc::new(report::build(
            WindowData {
                window,
                fetch: &current,
                interrupted: current_error,
            },
            WindowData {
                window: prior_window,
                fetch: &prior,
                interrupted: prior_error,
            },
            filter,
            self.options,
            &mut rand::thread_rng(),
        ));

        let mut displayed = self
            .displayed
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !self.guard.is_current(ticket) {
            log::debug!("Selection #{} superseded", ticket.generation());
            return Ok(SelectionOutcome::Superseded);
        }
        *displayed = Some(Arc::clone(&report));
        drop(displayed);

        Ok(SelectionOutcome::Applied(report))
    }

    /// Fetches every borough's current and prior totals concurrently.
    ///
    /// Does not touch the displayed snapshot. A borough whose current
    /// window yields no records before failing carries its own error.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Window`] if the prior window cannot be
    /// derived.
    pub async fn borough_summaries(
        &self,
        window: &Window,
    ) -> Result<Vec<BoroughResult>, DashboardError> {
        let prior_window = window.prior()?;

        let results = join_all(Borough::ALL.iter().map(|&borough| {
            let prior_window = &prior_window;
            async move {
                let filter = DimensionFilter::borough(borough);
                let label = borough.slug();
                let prior_label = format!("{label} prior");
                let (current, prior) = tokio::join!(
                    self.fetch(&label, window, Some(&filter)),
                    self.fetch(&prior_label, prior_window, Some(&filter)),
                );
                (borough, summarize(borough, current, prior))
            }
        }))
        .await;

        let city_total: u64 = results
            .iter()
            .filter_map(|(_, r)| r.as_ref().ok())
            .map(|s| s.total)
            .sum();

        Ok(results
            .into_iter()
            .map(|(borough, result)| {
                let result = result.map(|mut summary| {
                    summary.share = percent(summary.total, city_total);
                    summary
                });
                (borough, result)
            })
            .collect())
    }

    /// Fetches the newest records filed in `zip`: `limit` of them, or the
    /// configured `zip_limit` when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Fetch`] if the lookup failed before
    /// yielding any records.
    pub async fn lookup_zip(
        &self,
        zip: ZipCode,
        limit: Option<u64>,
    ) -> Result<ZipReport, DashboardError> {
        let requested = limit.unwrap_or(self.zip_limit);
        let filter = DimensionFilter::zip(&zip);
        let progress = (self.progress)(&format!("zip {zip}"));

        let result = self
            .fetcher
            .fetch_latest(&filter, requested, &progress)
            .await;
        let (fetch, interrupted) = settle(result)?;

        Ok(lookup::build(
            zip,
            requested,
            &fetch,
            interrupted,
            self.options.top_n,
        ))
    }

    async fn fetch(
        &self,
        label: &str,
        window: &Window,
        filter: Option<&DimensionFilter>,
    ) -> Result<WindowFetch, FetchError> {
        let progress = (self.progress)(label);
        self.fetcher
            .fetch_all_with_progress(window, filter, &progress)
            .await
    }
}

/// Splits a fetch result into usable records and an optional warning.
///
/// Only a failure that produced no records at all is an error.
fn settle(
    result: Result<WindowFetch, FetchError>,
) -> Result<(WindowFetch, Option<String>), FetchError> {
    match result {
        Ok(fetch) => Ok((fetch, None)),
        Err(e) if e.partial().records.is_empty() => Err(e),
        Err(e) => {
            let message = e.to_string();
            log::warn!("Using partial results: {message}");
            Ok((e.into_partial(), Some(message)))
        }
    }
}

fn summarize(
    borough: Borough,
    current: Result<WindowFetch, FetchError>,
    prior: Result<WindowFetch, FetchError>,
) -> Result<BoroughSummary, DashboardError> {
    let (current, current_error) = settle(current)?;
    let (prior, prior_error) = match settle(prior) {
        Ok(settled) => settled,
        Err(e) => (WindowFetch::default(), Some(e.to_string())),
    };

    let total = current.records.len() as u64;
    let prior_total = prior.records.len() as u64;
    let top_complaint = count_by(&current.records, RecordField::ComplaintType)
        .into_iter()
        .next()
        .map(|e| e.name);

    Ok(BoroughSummary {
        borough,
        total,
        prior_total,
        delta_pct: delta_pct(total, prior_total),
        share: 0.0,
        top_complaint,
        peak_hour_label: hour_label(peak_hour(&hourly_histogram(&current.records))),
        was_capped: current.was_capped || prior.was_capped,
        warnings: current_error.into_iter().chain(prior_error).collect(),
    })
}
