#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Result types produced by the 311 aggregator.
//!
//! All types serialize with `camelCase` keys so they can be emitted as-is in
//! JSON reports.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of records sharing one field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountEntry {
    /// Group value (`"Unknown"` for absent values).
    pub name: String,
    /// Records in the group.
    pub value: u64,
    /// Percentage of the aggregated total, once computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share: Option<f64>,
}

impl CountEntry {
    /// An entry without a share.
    #[must_use]
    pub fn new(name: impl Into<String>, value: u64) -> Self {
        Self {
            name: name.into(),
            value,
            share: None,
        }
    }
}

/// One group compared across the current and prior windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaEntry {
    /// Group value.
    pub name: String,
    /// Count in the current window.
    pub current: u64,
    /// Count in the prior window.
    pub prior: u64,
    /// Percentage change from prior to current.
    pub delta_pct: f64,
}

/// Qualification and length of a fastest-risers ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RiserOptions {
    /// Minimum count in either window for a group to qualify.
    pub threshold: u64,
    /// Maximum rows returned.
    pub limit: usize,
}

impl Default for RiserOptions {
    fn default() -> Self {
        Self {
            threshold: 10,
            limit: 5,
        }
    }
}

/// A point in WGS 84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatLng {
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
}

/// Records created on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCount {
    /// Civil date.
    pub date: NaiveDate,
    /// Records created that day.
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_entry_omits_missing_share() {
        let json = serde_json::to_string(&CountEntry::new("Noise", 3)).unwrap();
        assert_eq!(json, r#"{"name":"Noise","value":3}"#);
    }

    #[test]
    fn delta_entry_uses_camel_case() {
        let entry = DeltaEntry {
            name: "Noise".to_string(),
            current: 5,
            prior: 0,
            delta_pct: 100.0,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["deltaPct"], 100.0);
    }

    #[test]
    fn riser_options_fill_missing_fields() {
        let options: RiserOptions = serde_json::from_str(r#"{"limit":3}"#).unwrap();
        assert_eq!(options.threshold, 10);
        assert_eq!(options.limit, 3);
    }
}
