//! Record-level summaries: closure rate, per-borough leaders, sampling, and
//! the geographic centre of a result set.

use nyc311_analytics_models::LatLng;
use nyc311_source_models::{Borough, Record, RecordField};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::counts::count_keys;
use crate::percent;

/// Percentage of records whose status contains "closed" (any case).
#[must_use]
pub fn closure_rate(records: &[Record]) -> f64 {
    let closed = records
        .iter()
        .filter(|r| {
            r.status
                .as_deref()
                .is_some_and(|s| s.to_ascii_lowercase().contains("closed"))
        })
        .count();
    percent(closed as u64, records.len() as u64)
}

/// Mean position of the records that carry usable coordinates, with how
/// many records contributed.
///
/// Returns `None` when no record has coordinates.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn centroid(records: &[Record]) -> Option<(LatLng, usize)> {
    let (lat_sum, lng_sum, located) = records
        .iter()
        .filter_map(Record::coordinates)
        .fold((0.0, 0.0, 0_usize), |(lat, lng, n), (la, ln)| {
            (lat + la, lng + ln, n + 1)
        });
    if located == 0 {
        return None;
    }
    Some((
        LatLng {
            latitude: lat_sum / located as f64,
            longitude: lng_sum / located as f64,
        },
        located,
    ))
}

/// Uniformly samples the descriptor of one record that has a non-empty
/// descriptor.
#[must_use]
pub fn pick_random_descriptor<'a, R: Rng + ?Sized>(
    records: &'a [Record],
    rng: &mut R,
) -> Option<&'a str> {
    let candidates: Vec<&str> = records
        .iter()
        .filter_map(|r| r.descriptor.as_deref())
        .filter(|d| !d.trim().is_empty())
        .collect();
    candidates.choose(rng).copied()
}

/// Most common value of `field` within each canonical borough.
///
/// Boroughs with no records map to `None`.
#[must_use]
pub fn top_value_by_borough(
    records: &[Record],
    field: RecordField,
) -> Vec<(Borough, Option<String>)> {
    Borough::ALL
        .iter()
        .map(|&borough| {
            let local = records
                .iter()
                .filter(|r| r.known_borough() == Some(borough))
                .map(|r| r.group_key(field));
            let top = count_keys(local).into_iter().next().map(|e| e.name);
            (borough, top)
        })
        .collect()
}
