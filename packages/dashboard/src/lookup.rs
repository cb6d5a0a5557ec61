//! Latest-records lookup for a single ZIP code.

use nyc311_analytics::{centroid, closure_rate, count_by, top_n, with_share};
use nyc311_analytics_models::{CountEntry, LatLng};
use nyc311_source::fetcher::WindowFetch;
use nyc311_source_models::{Record, RecordField, ZipCode};
use serde::{Deserialize, Serialize};

use crate::report::FetchSummary;

/// Records listed individually in a ZIP report.
pub const LATEST_SHOWN: usize = 10;

/// The newest records filed in one ZIP code and where they cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZipReport {
    /// ZIP code searched.
    pub zip: ZipCode,
    /// Records asked for.
    pub requested: u64,
    /// Fetch status.
    pub fetch: FetchSummary,
    /// Records returned.
    pub total: u64,
    /// Records with usable coordinates.
    pub located: u64,
    /// Mean position of the located records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<LatLng>,
    /// `created_date` of the newest record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newest: Option<String>,
    /// `created_date` of the oldest record returned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oldest: Option<String>,
    /// Leading complaint types with shares.
    pub complaints: Vec<CountEntry>,
    /// Status breakdown with shares.
    pub statuses: Vec<CountEntry>,
    /// Percentage of records reported closed.
    pub closure_rate: f64,
    /// The first [`LATEST_SHOWN`] records, newest first.
    pub latest: Vec<Record>,
}

/// Summarizes the newest-first records fetched for `zip`.
#[must_use]
pub fn build(
    zip: ZipCode,
    requested: u64,
    fetch: &WindowFetch,
    interrupted: Option<String>,
    top: usize,
) -> ZipReport {
    let records = &fetch.records;
    let total = records.len() as u64;
    let (center, located) = centroid(records).map_or((None, 0), |(c, n)| (Some(c), n));
    let ranked = |field| with_share(top_n(&count_by(records, field), top), total);

    ZipReport {
        zip,
        requested,
        fetch: FetchSummary::new(fetch, interrupted),
        total,
        located: located as u64,
        center,
        newest: records.first().and_then(|r| r.created_date.clone()),
        oldest: records.last().and_then(|r| r.created_date.clone()),
        complaints: ranked(RecordField::ComplaintType),
        statuses: ranked(RecordField::Status),
        closure_rate: closure_rate(records),
        latest: records.iter().take(LATEST_SHOWN).cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(i: usize, complaint: &str, coords: Option<(&str, &str)>) -> Record {
        Record {
            id: i.to_string(),
            created_date: Some(format!("2024-03-{:02}T08:00:00.000", 20 - i)),
            complaint_type: Some(complaint.to_string()),
            status: Some(if i % 2 == 0 { "Closed" } else { "Open" }.to_string()),
            latitude: coords.map(|(lat, _)| lat.to_string()),
            longitude: coords.map(|(_, lng)| lng.to_string()),
            ..Record::default()
        }
    }

    #[test]
    fn summarizes_latest_records() {
        let records: Vec<Record> = (0..12)
            .map(|i| {
                let complaint = if i < 8 { "Noise" } else { "Heat" };
                let coords = match i {
                    0 => Some(("40.70", "-73.90")),
                    1 => Some(("40.80", "-74.00")),
                    _ => None,
                };
                record(i, complaint, coords)
            })
            .collect();
        let fetch = WindowFetch {
            records,
            ..WindowFetch::default()
        };

        let report = build("11372".parse().unwrap(), 500, &fetch, None, 5);

        assert_eq!(report.total, 12);
        assert_eq!(report.requested, 500);
        assert_eq!(report.located, 2);
        let center = report.center.unwrap();
        assert!((center.latitude - 40.75).abs() < 1e-9);
        assert!((center.longitude - -73.95).abs() < 1e-9);
        assert_eq!(report.newest.as_deref(), Some("2024-03-20T08:00:00.000"));
        assert_eq!(report.oldest.as_deref(), Some("2024-03-09T08:00:00.000"));
        assert_eq!(report.complaints[0].name, "Noise");
        assert_eq!(report.complaints[0].value, 8);
        assert!((report.closure_rate - 50.0).abs() < 1e-9);
        assert_eq!(report.latest.len(), LATEST_SHOWN);
        assert_eq!(report.latest[0].id, "0");
        assert!(report.fetch.interrupted.is_none());
    }

    #[test]
    fn empty_lookup_has_no_center() {
        let report = build("10001".parse().unwrap(), 500, &WindowFetch::default(), None, 5);
        assert_eq!(report.total, 0);
        assert_eq!(report.located, 0);
        assert!(report.center.is_none());
        assert!(report.newest.is_none());
        assert!(report.latest.is_empty());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["zip"], "10001");
        assert!(json.get("center").is_none());
    }
}
