//! Serializable window reports.

use nyc311_analytics::{
    HOURS, borough_mix, busiest_day, closure_rate, count_by, count_by_known, daily_counts, delta,
    delta_pct, fastest_risers, hour_label, hourly_by_borough, hourly_histogram, peak_hour,
    pick_random_descriptor, top_n, top_value_by_borough, with_share,
};
use nyc311_analytics_models::{CountEntry, DailyCount, DeltaEntry, RiserOptions};
use nyc311_source::fetcher::WindowFetch;
use nyc311_source_models::{Borough, DimensionFilter, Record, RecordField, Window};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How one window's fetch went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchSummary {
    /// Records actually fetched.
    pub records: u64,
    /// Provider-reported total, when the count query succeeded.
    pub total_known: Option<u64>,
    /// Whether the safety ceiling truncated the fetch.
    pub was_capped: bool,
    /// Successful page calls.
    pub pages: u32,
    /// Throttle backoffs taken.
    pub throttle_retries: u32,
    /// Why the fetch stopped early, if it did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interrupted: Option<String>,
}

impl FetchSummary {
    /// Summarizes `fetch`, noting `interrupted` if the fetch failed part way.
    #[must_use]
    pub fn new(fetch: &WindowFetch, interrupted: Option<String>) -> Self {
        Self {
            records: fetch.records.len() as u64,
            total_known: fetch.total_known,
            was_capped: fetch.was_capped,
            pages: fetch.pages,
            throttle_retries: fetch.throttle_retries,
            interrupted,
        }
    }
}

/// Borough-level detail for citywide reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoroughHighlight {
    /// Borough.
    pub borough: Borough,
    /// Most common complaint type in the current window.
    pub top_complaint: Option<String>,
    /// Busiest hour of the day, as a 12-hour label.
    pub peak_hour: Option<String>,
}

/// Everything the dashboard shows for one selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowReport {
    /// Selected window.
    pub window: Window,
    /// Equal-length window immediately before it.
    pub prior_window: Window,
    /// Dimension filter applied to both windows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<DimensionFilter>,
    /// Current-window fetch status.
    pub current: FetchSummary,
    /// Prior-window fetch status.
    pub prior: FetchSummary,
    /// Records in the current window.
    pub total: u64,
    /// Records in the prior window.
    pub prior_total: u64,
    /// Change in total from prior to current.
    pub total_delta_pct: f64,
    /// Leading complaint types with shares.
    pub complaints: Vec<CountEntry>,
    /// Leading agencies with shares.
    pub agencies: Vec<CountEntry>,
    /// Status breakdown with shares.
    pub statuses: Vec<CountEntry>,
    /// Borough mix, canonical boroughs first.
    pub boroughs: Vec<CountEntry>,
    /// Complaint types compared with the prior window.
    pub complaint_deltas: Vec<DeltaEntry>,
    /// Complaint types with the largest increase.
    pub risers: Vec<DeltaEntry>,
    /// Records per hour of day.
    pub hourly: [u64; HOURS],
    /// Busiest hour of the day.
    pub peak_hour: usize,
    /// Twelve-hour label for [`Self::peak_hour`].
    pub peak_hour_label: String,
    /// Percentage of records reported closed.
    pub closure_rate: f64,
    /// Records per day, oldest first.
    pub daily: Vec<DailyCount>,
    /// Day with the most records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub busiest_day: Option<DailyCount>,
    /// ZIP code with the most records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub busiest_zip: Option<CountEntry>,
    /// Per-borough highlights; empty for borough-filtered reports.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub borough_highlights: Vec<BoroughHighlight>,
    /// One randomly chosen complaint descriptor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_descriptor: Option<String>,
}

impl WindowReport {
    /// Whether either window's fetch stopped early.
    #[must_use]
    pub const fn is_partial(&self) -> bool {
        self.current.interrupted.is_some() || self.prior.interrupted.is_some()
    }
}

/// Shaping options for [`build`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    /// Rows kept in each ranked list.
    pub top_n: usize,
    /// Fastest-risers qualification.
    pub risers: RiserOptions,
}

/// One window's fetched records and status.
pub struct WindowData<'a> {
    /// The window.
    pub window: Window,
    /// Its fetch result (possibly partial).
    pub fetch: &'a WindowFetch,
    /// Why the fetch stopped early, if it did.
    pub interrupted: Option<String>,
}

/// Aggregates a current/prior pair into a report.
#[must_use]
pub fn build<R: Rng + ?Sized>(
    current: WindowData<'_>,
    prior: WindowData<'_>,
    filter: Option<DimensionFilter>,
    options: ReportOptions,
    rng: &mut R,
) -> WindowReport {
    let records = &current.fetch.records;
    let total = records.len() as u64;
    let prior_total = prior.fetch.records.len() as u64;

    let complaints = count_by(records, RecordField::ComplaintType);
    let prior_complaints = count_by(&prior.fetch.records, RecordField::ComplaintType);
    let ranked = |field| with_share(top_n(&count_by(records, field), options.top_n), total);

    let hourly = hourly_histogram(records);
    let peak = peak_hour(&hourly);

    let borough_highlights = if filter.is_none() {
        highlights(records)
    } else {
        Vec::new()
    };

    WindowReport {
        window: current.window,
        prior_window: prior.window,
        filter,
        current: FetchSummary::new(current.fetch, current.interrupted),
        prior: FetchSummary::new(prior.fetch, prior.interrupted),
        total,
        prior_total,
        total_delta_pct: delta_pct(total, prior_total),
        complaints: with_share(top_n(&complaints, options.top_n), total),
        agencies: ranked(RecordField::AgencyName),
        statuses: ranked(RecordField::Status),
        boroughs: borough_mix(records),
        complaint_deltas: top_n_deltas(delta(&complaints, &prior_complaints), options.top_n),
        risers: fastest_risers(&complaints, &prior_complaints, options.risers),
        hourly,
        peak_hour: peak,
        peak_hour_label: hour_label(peak),
        closure_rate: closure_rate(records),
        daily: daily_counts(records),
        busiest_day: busiest_day(records),
        busiest_zip: count_by_known(records, RecordField::IncidentZip)
            .into_iter()
            .next(),
        borough_highlights,
        sample_descriptor: pick_random_descriptor(records, rng).map(str::to_string),
    }
}

fn top_n_deltas(mut deltas: Vec<DeltaEntry>, n: usize) -> Vec<DeltaEntry> {
    deltas.truncate(n);
    deltas
}

fn highlights(records: &[Record]) -> Vec<BoroughHighlight> {
    let hourly = hourly_by_borough(records);
    top_value_by_borough(records, RecordField::ComplaintType)
        .into_iter()
        .zip(hourly)
        .map(|((borough, top_complaint), (_, histogram))| BoroughHighlight {
            borough,
            peak_hour: top_complaint
                .as_ref()
                .map(|_| hour_label(peak_hour(&histogram))),
            top_complaint,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn record(complaint: &str, borough: &str, created: &str) -> Record {
        Record {
            complaint_type: Some(complaint.to_string()),
            borough: Some(borough.to_string()),
            created_date: Some(created.to_string()),
            status: Some("Closed".to_string()),
            incident_zip: Some("11201".to_string()),
            descriptor: Some("Loud Music/Party".to_string()),
            ..Record::default()
        }
    }

    fn fetch(records: Vec<Record>) -> WindowFetch {
        WindowFetch {
            total_known: Some(records.len() as u64),
            records,
            ..WindowFetch::default()
        }
    }

    fn window() -> Window {
        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        Window::days(day, day).unwrap()
    }

    fn options() -> ReportOptions {
        ReportOptions {
            top_n: 10,
            risers: RiserOptions {
                threshold: 1,
                limit: 5,
            },
        }
    }

    #[test]
    fn builds_citywide_report() {
        let current = fetch(vec![
            record("Noise", "BROOKLYN", "2024-01-15T22:00:00.000"),
            record("Noise", "BROOKLYN", "2024-01-15T22:30:00.000"),
            record("Heat", "QUEENS", "2024-01-15T07:00:00.000"),
        ]);
        let prior = fetch(vec![
            record("Noise", "BROOKLYN", "2024-01-14T22:00:00.000"),
            record("Noise", "BRONX", "2024-01-14T23:00:00.000"),
        ]);
        let window = window();

        let report = build(
            WindowData {
                window,
                fetch: &current,
                interrupted: None,
            },
            WindowData {
                window: window.prior().unwrap(),
                fetch: &prior,
                interrupted: None,
            },
            None,
            options(),
            &mut StdRng::seed_from_u64(3),
        );

        assert_eq!(report.total, 3);
        assert_eq!(report.prior_total, 2);
        assert!((report.total_delta_pct - 50.0).abs() < 1e-9);
        assert_eq!(report.complaints[0].name, "Noise");
        assert_eq!(report.risers[0].name, "Heat");
        assert_eq!(report.peak_hour, 22);
        assert_eq!(report.peak_hour_label, "10 PM");
        assert!((report.closure_rate - 100.0).abs() < 1e-9);
        assert_eq!(report.busiest_zip.as_ref().map(|z| z.value), Some(3));
        assert_eq!(report.borough_highlights.len(), 5);
        assert_eq!(
            report.borough_highlights[1].top_complaint.as_deref(),
            Some("Noise")
        );
        assert_eq!(report.borough_highlights[0].peak_hour, None);
        assert_eq!(report.sample_descriptor.as_deref(), Some("Loud Music/Party"));
        assert!(!report.is_partial());
    }

    #[test]
    fn borough_report_omits_highlights_and_flags_partial() {
        let current = fetch(vec![record("Noise", "BRONX", "2024-01-15T01:00:00")]);
        let prior = fetch(Vec::new());
        let window = window();

        let report = build(
            WindowData {
                window,
                fetch: &current,
                interrupted: Some("HTTP 500".to_string()),
            },
            WindowData {
                window: window.prior().unwrap(),
                fetch: &prior,
                interrupted: None,
            },
            Some(DimensionFilter::borough(Borough::Bronx)),
            options(),
            &mut StdRng::seed_from_u64(3),
        );

        assert!(report.borough_highlights.is_empty());
        assert!(report.is_partial());
        assert!((report.total_delta_pct - 100.0).abs() < 1e-9);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["current"]["interrupted"], "HTTP 500");
        assert_eq!(json["hourly"].as_array().map(Vec::len), Some(24));
        assert_eq!(json["filter"]["value"], "BRONX");
    }
}
