//! Grouped counts and shares.

use std::collections::HashMap;

use nyc311_analytics_models::CountEntry;
use nyc311_source_models::{Borough, Record, RecordField, UNKNOWN};

use crate::percent;

/// Groups `records` by `field` and sorts the groups by descending count.
///
/// Absent or empty values are grouped under `"Unknown"`. Groups with equal
/// counts keep the order in which they were first encountered.
#[must_use]
pub fn count_by(records: &[Record], field: RecordField) -> Vec<CountEntry> {
    count_keys(records.iter().map(|r| r.group_key(field)))
}

pub(crate) fn count_keys<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<CountEntry> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut entries: Vec<CountEntry> = Vec::new();

    for key in keys {
        if let Some(&i) = index.get(key) {
            entries[i].value += 1;
        } else {
            index.insert(key, entries.len());
            entries.push(CountEntry::new(key, 1));
        }
    }

    entries.sort_by(|a, b| b.value.cmp(&a.value));
    entries
}

/// Like [`count_by`], without the `"Unknown"` group.
#[must_use]
pub fn count_by_known(records: &[Record], field: RecordField) -> Vec<CountEntry> {
    let mut entries = count_by(records, field);
    entries.retain(|e| e.name != UNKNOWN);
    entries
}

/// Annotates each entry with its percentage of `total`.
///
/// Every share is 0 when `total` is 0.
#[must_use]
pub fn with_share(entries: &[CountEntry], total: u64) -> Vec<CountEntry> {
    entries
        .iter()
        .map(|e| CountEntry {
            share: Some(percent(e.value, total)),
            ..e.clone()
        })
        .collect()
}

/// The first `n` entries, or all of them if there are fewer.
#[must_use]
pub fn top_n(entries: &[CountEntry], n: usize) -> &[CountEntry] {
    &entries[..n.min(entries.len())]
}

/// Borough counts with shares of all records, canonical boroughs first.
///
/// The five boroughs that occur appear in canonical order; any other value
/// (`"Unspecified"`, `"Unknown"`) follows in count order.
#[must_use]
pub fn borough_mix(records: &[Record]) -> Vec<CountEntry> {
    let counted = with_share(
        &count_by(records, RecordField::Borough),
        records.len() as u64,
    );
    let (mut canonical, other): (Vec<_>, Vec<_>) = counted
        .into_iter()
        .partition(|e| e.name.parse::<Borough>().is_ok());

    canonical.sort_by_key(|e| e.name.parse::<Borough>().map_or(usize::MAX, Borough::index));
    canonical.extend(other);
    canonical
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complaints(types: &[&str]) -> Vec<Record> {
        types
            .iter()
            .map(|t| Record {
                complaint_type: Some((*t).to_string()),
                ..Record::default()
            })
            .collect()
    }

    fn boroughs(names: &[&str]) -> Vec<Record> {
        names
            .iter()
            .map(|b| Record {
                borough: Some((*b).to_string()),
                ..Record::default()
            })
            .collect()
    }

    fn pairs(entries: &[CountEntry]) -> Vec<(&str, u64)> {
        entries.iter().map(|e| (e.name.as_str(), e.value)).collect()
    }

    #[test]
    fn count_by_sorts_descending() {
        let records = complaints(&["A", "B", "A", "C", "B", "B"]);
        assert_eq!(
            pairs(&count_by(&records, RecordField::ComplaintType)),
            vec![("B", 3), ("A", 2), ("C", 1)]
        );
    }

    #[test]
    fn count_by_keeps_first_seen_order_for_ties() {
        let records = complaints(&["C", "A", "B", "A", "C", "B"]);
        assert_eq!(
            pairs(&count_by(&records, RecordField::ComplaintType)),
            vec![("C", 2), ("A", 2), ("B", 2)]
        );
    }

    #[test]
    fn count_by_groups_missing_as_unknown() {
        let mut records = complaints(&["A", ""]);
        records.push(Record::default());
        let entries = count_by(&records, RecordField::ComplaintType);
        assert_eq!(pairs(&entries), vec![("Unknown", 2), ("A", 1)]);
        assert_eq!(entries.iter().map(|e| e.value).sum::<u64>(), 3);

        assert_eq!(
            pairs(&count_by_known(&records, RecordField::ComplaintType)),
            vec![("A", 1)]
        );
    }

    #[test]
    fn count_by_on_empty_input() {
        assert!(count_by(&[], RecordField::Borough).is_empty());
    }

    #[test]
    fn shares_sum_to_one_hundred() {
        let records = complaints(&["A", "B", "A", "C", "B", "B", "D"]);
        let entries = with_share(&count_by(&records, RecordField::ComplaintType), 7);
        let sum: f64 = entries.iter().filter_map(|e| e.share).sum();
        assert!((sum - 100.0).abs() < 1e-9);
        assert!((entries[0].share.unwrap() - 300.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn shares_are_zero_for_empty_total() {
        let entries = with_share(&[CountEntry::new("A", 0)], 0);
        assert_eq!(entries[0].share, Some(0.0));
    }

    #[test]
    fn top_n_is_a_prefix() {
        let entries = count_by(&complaints(&["A", "B", "A"]), RecordField::ComplaintType);
        assert_eq!(pairs(top_n(&entries, 1)), vec![("A", 2)]);
        assert_eq!(top_n(&entries, 10).len(), 2);
        assert!(top_n(&entries, 0).is_empty());
    }

    #[test]
    fn borough_mix_orders_canonically_then_others() {
        let records = boroughs(&[
            "QUEENS",
            "Unspecified",
            "QUEENS",
            "MANHATTAN",
            "Unspecified",
            "Unspecified",
            "STATEN ISLAND",
        ]);
        let mix = borough_mix(&records);
        assert_eq!(
            pairs(&mix),
            vec![
                ("MANHATTAN", 1),
                ("QUEENS", 2),
                ("STATEN ISLAND", 1),
                ("Unspecified", 3),
            ]
        );
        let sum: f64 = mix.iter().filter_map(|e| e.share).sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }
}
