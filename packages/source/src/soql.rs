//! SoQL query construction.
//!
//! Renders the `$select`, `$where`, `$order`, `$limit`, and `$offset`
//! parameters understood by the Socrata SODA API.

use std::fmt;

use nyc311_source_models::{DimensionFilter, RecordField, Window};

/// Sort direction for `$order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

/// A `$order` clause over a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    /// Column to sort by.
    pub field: RecordField,
    /// Sort direction.
    pub direction: SortDirection,
}

impl OrderBy {
    /// Descending order on `field` (newest first for timestamps).
    #[must_use]
    pub const fn desc(field: RecordField) -> Self {
        Self {
            field,
            direction: SortDirection::Desc,
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        write!(f, "{} {dir}", self.field)
    }
}

/// One page request against the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoqlQuery {
    /// Column projection. Empty selects every column.
    pub select: Vec<RecordField>,
    /// `$where` predicate, if any.
    pub where_clause: Option<String>,
    /// Sort order. Must be stable for offset pagination to be well defined.
    pub order: OrderBy,
    /// Maximum rows to return.
    pub limit: u64,
    /// Rows to skip.
    pub offset: u64,
}

impl SoqlQuery {
    /// Renders the query as SODA query-string parameters.
    #[must_use]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(5);
        if !self.select.is_empty() {
            let columns = self
                .select
                .iter()
                .map(AsRef::<str>::as_ref)
                .collect::<Vec<&str>>()
                .join(", ");
            params.push(("$select", columns));
        }
        if let Some(where_clause) = &self.where_clause {
            params.push(("$where", where_clause.clone()));
        }
        params.push(("$order", self.order.to_string()));
        params.push(("$limit", self.limit.to_string()));
        params.push(("$offset", self.offset.to_string()));
        params
    }
}

/// Escapes a string for use inside a single-quoted SoQL literal.
#[must_use]
pub fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Renders `field='value'` for a dimension filter.
#[must_use]
pub fn filter_predicate(filter: &DimensionFilter) -> String {
    format!("{}='{}'", filter.field, escape_literal(&filter.value))
}

/// Builds the `$where` predicate for a window plus an optional filter.
#[must_use]
pub fn window_predicate(
    window: &Window,
    date_column: RecordField,
    filter: Option<&DimensionFilter>,
) -> String {
    let range = window.where_clause(date_column.as_ref());
    match filter {
        Some(filter) => format!("{} AND {range}", filter_predicate(filter)),
        None => range,
    }
}
