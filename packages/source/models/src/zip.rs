//! Five-digit ZIP codes for incident lookups.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{DimensionFilter, RecordField};

/// A ZIP code that has been checked to be exactly five ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ZipCode(String);

/// Input that is not a five-digit ZIP code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid 5-digit ZIP code")]
pub struct ZipCodeError(String);

impl ZipCode {
    /// The five digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ZipCode {
    type Err = ZipCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.len() == 5 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(ZipCodeError(s.to_string()))
        }
    }
}

impl TryFrom<String> for ZipCode {
    type Error = ZipCodeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ZipCode> for String {
    fn from(zip: ZipCode) -> Self {
        zip.0
    }
}

impl fmt::Display for ZipCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl DimensionFilter {
    /// Filters to one incident ZIP code.
    #[must_use]
    pub fn zip(zip: &ZipCode) -> Self {
        Self::new(RecordField::IncidentZip, zip.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_five_digits() {
        let zip: ZipCode = " 11372 ".parse().unwrap();
        assert_eq!(zip.as_str(), "11372");
        assert_eq!(zip.to_string(), "11372");
    }

    #[test]
    fn rejects_everything_else() {
        for input in ["", "1137", "113720", "1137a", "11 372", "１１３７２"] {
            assert!(input.parse::<ZipCode>().is_err(), "accepted {input:?}");
        }
        assert_eq!(
            "abc".parse::<ZipCode>().unwrap_err().to_string(),
            "'abc' is not a valid 5-digit ZIP code"
        );
    }

    #[test]
    fn zip_filter_targets_incident_zip() {
        let filter = DimensionFilter::zip(&"10001".parse().unwrap());
        assert_eq!(filter.field, RecordField::IncidentZip);
        assert_eq!(filter.value, "10001");
    }

    #[test]
    fn deserializing_validates() {
        assert!(serde_json::from_str::<ZipCode>(r#""10001""#).is_ok());
        assert!(serde_json::from_str::<ZipCode>(r#""1000""#).is_err());
    }
}
