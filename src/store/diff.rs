//! Snapshot comparison.
//!
//! Compares two snapshots province by province on `confirmedCount`:
//! - Matches top-level rows by region name
//! - Reports grew, shrank, new, gone; unchanged rows are omitted
//! - Net change summary

use crate::snapshot::RawStatRecord;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum DiffType {
    Grew,
    Shrank,
    New,
    Gone,
}

#[derive(Debug, Clone)]
pub struct DiffEntry {
    pub name: String,
    pub old_count: u64,
    pub new_count: u64,
    pub delta: i64,
    pub diff_type: DiffType,
}

pub struct DiffResult {
    pub entries: Vec<DiffEntry>,
    pub net_change: i64,
    pub from_key: String,
    pub to_key: String,
}

fn signed(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

// BTreeMap keeps output ordered by region name.
fn by_name(records: &[RawStatRecord]) -> BTreeMap<&str, u64> {
    let mut map = BTreeMap::new();
    for record in records {
        map.insert(record.name(), record.confirmed_count);
    }
    map
}

/// Compare two snapshots' top-level records.
pub fn compare_snapshots(
    from_records: &[RawStatRecord],
    to_records: &[RawStatRecord],
    from_key: &str,
    to_key: &str,
) -> DiffResult {
    let from_map = by_name(from_records);
    let to_map = by_name(to_records);

    let mut diff_entries = Vec::new();
    let mut net_change: i64 = 0;

    for (&name, &to_count) in &to_map {
        let (old_count, diff_type) = match from_map.get(name) {
            Some(&old) if old == to_count => continue,
            Some(&old) if to_count > old => (old, DiffType::Grew),
            Some(&old) => (old, DiffType::Shrank),
            None => (0, DiffType::New),
        };
        let delta = signed(to_count).saturating_sub(signed(old_count));

        diff_entries.push(DiffEntry {
            name: name.to_string(),
            old_count,
            new_count: to_count,
            delta,
            diff_type,
        });
        net_change = net_change.saturating_add(delta);
    }

    for (&name, &from_count) in &from_map {
        if !to_map.contains_key(name) {
            let delta = -signed(from_count);

            diff_entries.push(DiffEntry {
                name: name.to_string(),
                old_count: from_count,
                new_count: 0,
                delta,
                diff_type: DiffType::Gone,
            });
            net_change = net_change.saturating_add(delta);
        }
    }

    DiffResult {
        entries: diff_entries,
        net_change,
        from_key: from_key.to_string(),
        to_key: to_key.to_string(),
    }
}
