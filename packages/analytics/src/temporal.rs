//! Time-of-day and per-day bucketing.
//!
//! Timestamps are bucketed in provider-local civil time exactly as they
//! appear in `created_date`; no zone conversion happens here.

use std::collections::BTreeMap;

use chrono::Timelike;
use nyc311_analytics_models::DailyCount;
use nyc311_source_models::{Borough, Record};

/// Buckets in an hourly histogram.
pub const HOURS: usize = 24;

/// Counts records by hour of creation. Unparseable timestamps are skipped.
#[must_use]
pub fn hourly_histogram(records: &[Record]) -> [u64; HOURS] {
    let mut buckets = [0; HOURS];
    for ts in records.iter().filter_map(Record::created_at) {
        buckets[ts.hour() as usize] += 1;
    }
    buckets
}

/// Hourly histogram per canonical borough, in canonical order.
///
/// Records without a recognizable borough are skipped.
#[must_use]
pub fn hourly_by_borough(records: &[Record]) -> Vec<(Borough, [u64; HOURS])> {
    let mut out: Vec<(Borough, [u64; HOURS])> =
        Borough::ALL.iter().map(|&b| (b, [0; HOURS])).collect();
    for record in records {
        if let (Some(borough), Some(ts)) = (record.known_borough(), record.created_at()) {
            out[borough.index()].1[ts.hour() as usize] += 1;
        }
    }
    out
}

/// Hour with the most records. The earliest hour wins ties; an all-zero
/// histogram yields hour 0.
#[must_use]
pub fn peak_hour(histogram: &[u64; HOURS]) -> usize {
    let mut peak = 0;
    for (hour, &count) in histogram.iter().enumerate() {
        if count > histogram[peak] {
            peak = hour;
        }
    }
    peak
}

/// Twelve-hour clock label, e.g. `"12 AM"` or `"3 PM"`.
#[must_use]
pub fn hour_label(hour: usize) -> String {
    let hour = hour % HOURS;
    let h12 = match hour % 12 {
        0 => 12,
        h => h,
    };
    let meridiem = if hour < 12 { "AM" } else { "PM" };
    format!("{h12} {meridiem}")
}

/// Records per calendar day, oldest first. Unparseable timestamps are
/// skipped.
#[must_use]
pub fn daily_counts(records: &[Record]) -> Vec<DailyCount> {
    let mut days: BTreeMap<chrono::NaiveDate, u64> = BTreeMap::new();
    for ts in records.iter().filter_map(Record::created_at) {
        *days.entry(ts.date()).or_default() += 1;
    }
    days.into_iter()
        .map(|(date, count)| DailyCount { date, count })
        .collect()
}

/// The day with the most records; the earliest such day on ties.
#[must_use]
pub fn busiest_day(records: &[Record]) -> Option<DailyCount> {
    daily_counts(records)
        .into_iter()
        .reduce(|best, day| if day.count > best.count { day } else { best })
}
