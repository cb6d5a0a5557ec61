#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregations over fetched 311 records.
//!
//! Every function here is pure and deterministic: it borrows its input,
//! never mutates it, and returns freshly built values. Malformed fields
//! (unparseable timestamps, missing categories) are skipped or bucketed as
//! `"Unknown"` rather than reported as errors.

pub mod compare;
pub mod counts;
pub mod records;
pub mod temporal;

pub use compare::{delta, delta_pct, fastest_risers};
pub use counts::{borough_mix, count_by, count_by_known, top_n, with_share};
pub use records::{centroid, closure_rate, pick_random_descriptor, top_value_by_borough};
pub use temporal::{
    HOURS, busiest_day, daily_counts, hour_label, hourly_by_borough, hourly_histogram, peak_hour,
};

/// `part / whole * 100`, or 0 when `whole` is zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_of_empty_whole_is_zero() {
        assert!((percent(3, 0) - 0.0).abs() < f64::EPSILON);
        assert!((percent(1, 4) - 25.0).abs() < f64::EPSILON);
    }
}
