//! Terminal tables for a prepared dashboard.
//!
//! - Country table sorted by confirmed count descending
//! - One block per province with its cities and coordinates

use super::{Counts, Dashboard};
use crate::store::InventoryEntry;

const NAME_WIDTH: usize = 20;

pub fn render(dashboard: &Dashboard) -> String {
    if dashboard.provinces.is_empty() {
        return String::from("No records in snapshot.\n");
    }

    let mut output = String::new();

    output.push_str(&format!(
        "\n{} {}例  (snapshot {})\n",
        dashboard.country, dashboard.confirmed_total, dashboard.snapshot
    ));
    output.push_str(&header("province"));

    let mut provinces: Vec<_> = dashboard.provinces.iter().collect();
    provinces.sort_by_key(|p| std::cmp::Reverse(p.counts.confirmed));
    for row in provinces {
        output.push_str(&counts_line(&row.province, &row.counts));
    }

    for province in &dashboard.cities {
        output.push_str(&format!(
            "\n{} {}例\n",
            province.province, province.confirmed_total
        ));
        output.push_str(&header("city"));
        for city in &province.cities {
            let mut line = counts_line(&city.city, &city.counts);
            line.pop();
            match city.coordinates {
                Some(c) => line.push_str(&format!("  ({:.4}, {:.4})\n", c.latitude, c.longitude)),
                None => line.push_str("  (unresolved)\n"),
            }
            output.push_str(&line);
        }
    }

    output
}

/// Listing of inventory entries with their position.
pub fn render_entries(entries: &[(usize, &InventoryEntry)]) -> String {
    if entries.is_empty() {
        return String::from("No snapshots found.\n");
    }

    let mut output = format!("{:<6} {:<10} {:<17} {:>10}\n", "Index", "Date", "Key", "Confirmed");
    output.push_str(&"-".repeat(46));
    output.push('\n');

    for (index, entry) in entries {
        let total = entry
            .confirmed_total
            .map(|t| t.to_string())
            .unwrap_or_else(|| "?".to_string());
        output.push_str(&format!(
            "{:<6} {:<10} {:<17} {:>10}\n",
            index, entry.date, entry.key, total
        ));
    }
    output
}

fn header(label: &str) -> String {
    let mut h = format!(
        "  {:width$} {:>9} {:>9} {:>9} {:>9}\n",
        label,
        "confirmed",
        "suspected",
        "cured",
        "dead",
        width = NAME_WIDTH
    );
    h.push_str("  ");
    h.push_str(&"-".repeat(NAME_WIDTH + 40));
    h.push('\n');
    h
}

fn counts_line(name: &str, counts: &Counts) -> String {
    format!(
        "  {:width$} {:>9} {:>9} {:>9} {:>9}\n",
        truncate(name, NAME_WIDTH),
        counts.confirmed,
        counts.suspected,
        counts.cured,
        counts.dead,
        width = NAME_WIDTH
    )
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    }
}
