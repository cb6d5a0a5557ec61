#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! NYC 311 service-request records and the time windows used to scope them.
//!
//! Every fetch produces [`Record`]s exactly as the Socrata provider returned
//! them. Records are never mutated after fetching; the aggregation layer only
//! derives new structures from them.

mod lenient;
pub mod parsing;
pub mod window;
pub mod zip;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use window::{DimensionFilter, Window, WindowError};
pub use zip::{ZipCode, ZipCodeError};

/// Group key used for records whose field is absent or empty.
pub const UNKNOWN: &str = "Unknown";

/// A provider column on the 311 service-request dataset.
///
/// The `snake_case` string form is the Socrata column name, so it can be
/// used directly in `$select`, `$order`, and `$where` expressions.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecordField {
    /// Unique service-request key.
    UniqueKey,
    /// When the request was created (provider-local civil time).
    CreatedDate,
    /// Complaint category (e.g. "Noise - Residential").
    ComplaintType,
    /// Finer-grained complaint description.
    Descriptor,
    /// Borough name in upper case.
    Borough,
    /// Responding agency.
    AgencyName,
    /// Request status (e.g. "Closed", "In Progress").
    Status,
    /// Type of location (e.g. "Street/Sidewalk").
    LocationType,
    /// Five-digit incident ZIP code.
    IncidentZip,
    /// City name.
    City,
    /// Free-text resolution description.
    ResolutionDescription,
    /// Latitude (numeric string).
    Latitude,
    /// Longitude (numeric string).
    Longitude,
}

impl RecordField {
    /// Every column a [`Record`] knows how to hold.
    pub const ALL: &[Self] = &[
        Self::UniqueKey,
        Self::CreatedDate,
        Self::ComplaintType,
        Self::Descriptor,
        Self::Borough,
        Self::AgencyName,
        Self::Status,
        Self::LocationType,
        Self::IncidentZip,
        Self::City,
        Self::ResolutionDescription,
        Self::Latitude,
        Self::Longitude,
    ];
}

/// One of the five NYC boroughs, in the canonical display order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(ascii_case_insensitive)]
pub enum Borough {
    /// Manhattan
    #[strum(to_string = "MANHATTAN")]
    Manhattan,
    /// Brooklyn
    #[strum(to_string = "BROOKLYN")]
    Brooklyn,
    /// Queens
    #[strum(to_string = "QUEENS")]
    Queens,
    /// The Bronx
    #[strum(to_string = "BRONX")]
    Bronx,
    /// Staten Island
    #[serde(rename = "STATEN ISLAND")]
    #[strum(to_string = "STATEN ISLAND")]
    StatenIsland,
}

impl Borough {
    /// All boroughs in canonical order.
    pub const ALL: &[Self] = &[
        Self::Manhattan,
        Self::Brooklyn,
        Self::Queens,
        Self::Bronx,
        Self::StatenIsland,
    ];

    /// URL-style slug, e.g. `"staten-island"`.
    #[must_use]
    pub fn slug(self) -> String {
        self.as_ref().to_lowercase().replace(' ', "-")
    }

    /// Parses either a provider name (`"STATEN ISLAND"`) or a slug
    /// (`"staten-island"`), ignoring case.
    #[must_use]
    pub fn parse_loose(s: &str) -> Option<Self> {
        s.trim().replace('-', " ").parse().ok()
    }

    /// Position in [`Self::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Manhattan => 0,
            Self::Brooklyn => 1,
            Self::Queens => 2,
            Self::Bronx => 3,
            Self::StatenIsland => 4,
        }
    }
}

/// A single 311 service request as returned by the provider.
///
/// All columns except the key are optional: the provider omits columns that
/// are null for a given row, and values that are present arrive as strings
/// (numbers and booleans are accepted and stringified).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Provider `unique_key`. Trusted to be unique; not enforced.
    #[serde(
        rename = "unique_key",
        default,
        deserialize_with = "lenient::string"
    )]
    pub id: String,
    /// Creation timestamp string (provider-local civil time).
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_date: Option<String>,
    /// Complaint category.
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub complaint_type: Option<String>,
    /// Finer-grained complaint description.
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub descriptor: Option<String>,
    /// Borough name as reported (may be `"Unspecified"`).
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub borough: Option<String>,
    /// Responding agency.
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub agency_name: Option<String>,
    /// Request status.
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<String>,
    /// Type of location.
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub location_type: Option<String>,
    /// Incident ZIP code.
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub incident_zip: Option<String>,
    /// City name.
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub city: Option<String>,
    /// Resolution text, if resolved.
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub resolution_description: Option<String>,
    /// Latitude (numeric string).
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub latitude: Option<String>,
    /// Longitude (numeric string).
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub longitude: Option<String>,
}

impl Record {
    /// Returns the raw value of `field`, if present.
    #[must_use]
    pub fn field(&self, field: RecordField) -> Option<&str> {
        let value = match field {
            RecordField::UniqueKey => return Some(self.id.as_str()),
            RecordField::CreatedDate => &self.created_date,
            RecordField::ComplaintType => &self.complaint_type,
            RecordField::Descriptor => &self.descriptor,
            RecordField::Borough => &self.borough,
            RecordField::AgencyName => &self.agency_name,
            RecordField::Status => &self.status,
            RecordField::LocationType => &self.location_type,
            RecordField::IncidentZip => &self.incident_zip,
            RecordField::City => &self.city,
            RecordField::ResolutionDescription => &self.resolution_description,
            RecordField::Latitude => &self.latitude,
            RecordField::Longitude => &self.longitude,
        };
        value.as_deref()
    }

    /// Returns the grouping key for `field`: the value, or [`UNKNOWN`] when
    /// the value is absent or empty.
    #[must_use]
    pub fn group_key(&self, field: RecordField) -> &str {
        match self.field(field) {
            Some(value) if !value.is_empty() => value,
            _ => UNKNOWN,
        }
    }

    /// Parses `created_date` as provider-local civil time.
    #[must_use]
    pub fn created_at(&self) -> Option<NaiveDateTime> {
        self.created_date
            .as_deref()
            .and_then(parsing::parse_timestamp)
    }

    /// The record's borough, if it is one of the five canonical ones.
    #[must_use]
    pub fn known_borough(&self) -> Option<Borough> {
        self.borough.as_deref().and_then(|b| b.parse().ok())
    }

    /// Latitude/longitude pair, if both parse and neither is zero.
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        parsing::parse_lat_lng(self.latitude.as_deref(), self.longitude.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_sparse_provider_row() {
        let json = r#"{
            "unique_key": "59893711",
            "created_date": "2024-01-15T14:30:00.000",
            "complaint_type": "Noise - Residential",
            "borough": "BROOKLYN",
            "location": {"latitude": "40.6", "longitude": "-73.9"}
        }"#;
        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "59893711");
        assert_eq!(record.complaint_type.as_deref(), Some("Noise - Residential"));
        assert_eq!(record.status, None);
        assert_eq!(record.known_borough(), Some(Borough::Brooklyn));
    }

    #[test]
    fn stringifies_non_string_values() {
        let json = r#"{"unique_key": 12345, "incident_zip": 11201, "status": null, "latitude": 40.7}"#;
        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "12345");
        assert_eq!(record.incident_zip.as_deref(), Some("11201"));
        assert_eq!(record.status, None);
        assert_eq!(record.latitude.as_deref(), Some("40.7"));
    }

    #[test]
    fn group_key_falls_back_to_unknown() {
        let record = Record {
            complaint_type: Some(String::new()),
            ..Record::default()
        };
        assert_eq!(record.group_key(RecordField::ComplaintType), UNKNOWN);
        assert_eq!(record.group_key(RecordField::Borough), UNKNOWN);
    }

    #[test]
    fn field_names_match_provider_columns() {
        assert_eq!(RecordField::UniqueKey.to_string(), "unique_key");
        assert_eq!(RecordField::AgencyName.as_ref(), "agency_name");
        assert_eq!(
            "incident_zip".parse::<RecordField>().unwrap(),
            RecordField::IncidentZip
        );
    }

    #[test]
    fn parses_boroughs_from_names_and_slugs() {
        assert_eq!(Borough::parse_loose("staten-island"), Some(Borough::StatenIsland));
        assert_eq!(Borough::parse_loose("STATEN ISLAND"), Some(Borough::StatenIsland));
        assert_eq!(Borough::parse_loose("Bronx"), Some(Borough::Bronx));
        assert_eq!(Borough::parse_loose("Unspecified"), None);
        assert_eq!(Borough::StatenIsland.slug(), "staten-island");
        assert_eq!(Borough::StatenIsland.to_string(), "STATEN ISLAND");
    }

    #[test]
    fn borough_index_matches_canonical_order() {
        for (i, borough) in Borough::ALL.iter().enumerate() {
            assert_eq!(borough.index(), i);
        }
    }

    #[test]
    fn coordinates_require_both_non_zero() {
        let record = Record {
            latitude: Some("40.7128".to_string()),
            longitude: Some("-74.006".to_string()),
            ..Record::default()
        };
        let (lat, lng) = record.coordinates().unwrap();
        assert!((lat - 40.7128).abs() < f64::EPSILON);
        assert!((lng - -74.006).abs() < f64::EPSILON);

        let missing = Record {
            latitude: Some("40.7128".to_string()),
            ..Record::default()
        };
        assert!(missing.coordinates().is_none());
    }
}
