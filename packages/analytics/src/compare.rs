//! Window-over-window comparison.

use std::collections::{HashMap, HashSet};

use nyc311_analytics_models::{CountEntry, DeltaEntry, RiserOptions};

/// Percentage change from `prior` to `current`.
///
/// A zero prior yields 100 when anything appeared and 0 otherwise, so new
/// groups rank as risers without dividing by zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn delta_pct(current: u64, prior: u64) -> f64 {
    if prior == 0 {
        if current > 0 { 100.0 } else { 0.0 }
    } else {
        (current as f64 - prior as f64) / prior as f64 * 100.0
    }
}

/// Outer-joins two count lists by name.
///
/// Rows follow `current`'s order, then names only seen in `prior` in
/// `prior`'s order. A name missing from one side counts as zero there.
#[must_use]
pub fn delta(current: &[CountEntry], prior: &[CountEntry]) -> Vec<DeltaEntry> {
    let prior_by_name: HashMap<&str, u64> =
        prior.iter().map(|e| (e.name.as_str(), e.value)).collect();
    let current_names: HashSet<&str> = current.iter().map(|e| e.name.as_str()).collect();

    let joined = current.iter().map(|e| {
        let before = prior_by_name.get(e.name.as_str()).copied().unwrap_or(0);
        entry(&e.name, e.value, before)
    });
    let prior_only = prior
        .iter()
        .filter(|e| !current_names.contains(e.name.as_str()))
        .map(|e| entry(&e.name, 0, e.value));

    joined.chain(prior_only).collect()
}

/// Groups with the largest percentage increase.
///
/// Only groups with at least `options.threshold` records in either window
/// qualify. Ties keep [`delta`]'s order.
#[must_use]
pub fn fastest_risers(
    current: &[CountEntry],
    prior: &[CountEntry],
    options: RiserOptions,
) -> Vec<DeltaEntry> {
    let mut rows: Vec<DeltaEntry> = delta(current, prior)
        .into_iter()
        .filter(|d| d.current >= options.threshold || d.prior >= options.threshold)
        .collect();
    rows.sort_by(|a, b| b.delta_pct.total_cmp(&a.delta_pct));
    rows.truncate(options.limit);
    rows
}

fn entry(name: &str, current: u64, prior: u64) -> DeltaEntry {
    DeltaEntry {
        name: name.to_string(),
        current,
        prior,
        delta_pct: delta_pct(current, prior),
    }
}
