//! Time windows and dimension filters.
//!
//! A [`Window`] is an inclusive `[start, end]` range of provider-local civil
//! timestamps at one-second resolution (the resolution of a SoQL timestamp
//! literal). Its [`prior`](Window::prior) window is the equal-duration range
//! ending one second before `start`, so the two never overlap.

use std::fmt;

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::parsing::format_soql_timestamp;
use crate::{Borough, RecordField};

/// Errors constructing or deriving a [`Window`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    /// The end bound precedes the start bound.
    #[error("window end {end} is before start {start}")]
    Inverted {
        /// Requested start.
        start: NaiveDateTime,
        /// Requested end.
        end: NaiveDateTime,
    },

    /// A trailing window must cover at least one day.
    #[error("window must span at least one day")]
    Empty,

    /// Date arithmetic left chrono's representable range.
    #[error("window bounds out of range")]
    OutOfRange,
}

/// One tick of window arithmetic.
fn tick() -> TimeDelta {
    TimeDelta::seconds(1)
}

/// An inclusive range of civil timestamps.
///
/// Deserialization goes through [`Window::new`], so inverted bounds are
/// rejected there too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "WindowBounds")]
pub struct Window {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

/// Unchecked wire form of a [`Window`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WindowBounds {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TryFrom<WindowBounds> for Window {
    type Error = WindowError;

    fn try_from(bounds: WindowBounds) -> Result<Self, Self::Error> {
        Self::new(bounds.start, bounds.end)
    }
}

impl Window {
    /// Creates a window from inclusive bounds.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::Inverted`] if `end < start`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, WindowError> {
        if end < start {
            return Err(WindowError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// Whole calendar days: `first 00:00:00` through `last 23:59:59`.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError`] if `last` precedes `first`.
    pub fn days(first: NaiveDate, last: NaiveDate) -> Result<Self, WindowError> {
        Self::new(first.and_time(NaiveTime::MIN), end_of_day(last)?)
    }

    /// The last `days` completed days before `today`, ending yesterday at
    /// 23:59:59.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::Empty`] when `days` is zero.
    pub fn trailing_days(today: NaiveDate, days: u32) -> Result<Self, WindowError> {
        if days == 0 {
            return Err(WindowError::Empty);
        }
        let first = today
            .checked_sub_days(Days::new(u64::from(days)))
            .ok_or(WindowError::OutOfRange)?;
        let last = today.pred_opt().ok_or(WindowError::OutOfRange)?;
        Self::days(first, last)
    }

    /// Inclusive start bound.
    #[must_use]
    pub const fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Inclusive end bound.
    #[must_use]
    pub const fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// `end - start`.
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// The equal-duration window immediately preceding this one.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::OutOfRange`] if the prior bounds cannot be
    /// represented.
    pub fn prior(&self) -> Result<Self, WindowError> {
        let end = self
            .start
            .checked_sub_signed(tick())
            .ok_or(WindowError::OutOfRange)?;
        let start = end
            .checked_sub_signed(self.duration())
            .ok_or(WindowError::OutOfRange)?;
        Ok(Self { start, end })
    }

    /// Whether `ts` falls inside the window (both bounds inclusive).
    #[must_use]
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.start <= ts && ts <= self.end
    }

    /// Renders a SoQL range predicate over `column`.
    #[must_use]
    pub fn where_clause(&self, column: &str) -> String {
        format!(
            "{column} between '{}' and '{}'",
            format_soql_timestamp(&self.start),
            format_soql_timestamp(&self.end)
        )
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} .. {}",
            format_soql_timestamp(&self.start),
            format_soql_timestamp(&self.end)
        )
    }
}

fn end_of_day(date: NaiveDate) -> Result<NaiveDateTime, WindowError> {
    date.succ_opt()
        .and_then(|next| next.and_time(NaiveTime::MIN).checked_sub_signed(tick()))
        .ok_or(WindowError::OutOfRange)
}

/// An equality condition on one column, e.g. `borough = 'BROOKLYN'`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionFilter {
    /// Column to compare.
    pub field: RecordField,
    /// Exact value the column must equal.
    pub value: String,
}

impl DimensionFilter {
    /// Filters on an arbitrary column.
    #[must_use]
    pub fn new(field: RecordField, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }

    /// Filters to a single borough.
    #[must_use]
    pub fn borough(borough: Borough) -> Self {
        Self::new(RecordField::Borough, borough.as_ref())
    }
}
