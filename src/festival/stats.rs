use std::collections::BTreeMap;

use serde::Serialize;

use crate::festival::models::ApplicationRecord;

/// One slice of the dashboard's genre distribution chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenreStat {
    pub genre: String,
    pub count: usize,
    /// Share of all genre tags, rounded to one decimal.
    pub percentage: f64,
}

/// Counts genre tags across a set of applications. A film tagged with two
/// genres contributes to both slices; percentages are over total tags so
/// they sum to ~100. Sorted by count descending, then name.
pub fn genre_distribution(apps: &[ApplicationRecord]) -> Vec<GenreStat> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for app in apps {
        for genre in &app.genres {
            *counts.entry(genre.as_str()).or_insert(0) += 1;
        }
    }

    let total: usize = counts.values().sum();
    if total == 0 {
        return Vec::new();
    }

    let mut stats: Vec<GenreStat> = counts
        .into_iter()
        .map(|(genre, count)| GenreStat {
            genre: genre.to_string(),
            count,
            percentage: (count as f64 * 1000.0 / total as f64).round() / 10.0,
        })
        .collect();
    stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.genre.cmp(&b.genre)));
    stats
}
