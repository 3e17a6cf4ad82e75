use serde::Serialize;

use crate::error::DeskError;
use crate::festival::models::ScoreEntry;

/// Upper bound of a reviewer's total score, inclusive.
pub const MAX_TOTAL_SCORE: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSummary {
    pub average: f64,
    pub count: usize,
}

/// Straight arithmetic mean over `total_score`; no weighting, no outlier
/// rejection. The list is bounded by reviewer headcount, so this is
/// recomputed on every read rather than cached.
pub fn summarize(scores: &[ScoreEntry]) -> ScoreSummary {
    if scores.is_empty() {
        return ScoreSummary {
            average: 0.0,
            count: 0,
        };
    }
    let sum: f64 = scores.iter().map(|s| s.total_score).sum();
    ScoreSummary {
        average: sum / scores.len() as f64,
        count: scores.len(),
    }
}

/// Replaces any existing entry with the same `admin_id`, then appends.
/// Keeps the at-most-one-entry-per-reviewer invariant.
pub fn upsert(scores: &mut Vec<ScoreEntry>, entry: ScoreEntry) {
    scores.retain(|s| s.admin_id != entry.admin_id);
    scores.push(entry);
}

/// Mutation-boundary validation. Nothing is clamped; out-of-range input is
/// rejected before anything touches the store.
pub fn validate(entry: &ScoreEntry) -> Result<(), DeskError> {
    if entry.admin_id.is_empty() {
        return Err(DeskError::InvalidScore("missing reviewer id".to_string()));
    }
    if !entry.total_score.is_finite() || !(0.0..=MAX_TOTAL_SCORE).contains(&entry.total_score) {
        return Err(DeskError::InvalidScore(format!(
            "totalScore {} outside 0..={MAX_TOTAL_SCORE}",
            entry.total_score
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(admin_id: &str, total: f64) -> ScoreEntry {
        ScoreEntry {
            admin_id: admin_id.to_string(),
            admin_name: format!("Judge {admin_id}"),
            criteria: Default::default(),
            total_score: total,
            comments: None,
            scored_at: Utc::now(),
        }
    }

    #[test]
    fn empty_list_averages_to_zero() {
        let summary = summarize(&[]);
        assert_eq!(summary.average, 0.0);
        assert_eq!(summary.count, 0);
    }

    #[test]
    fn average_is_a_straight_mean() {
        let summary = summarize(&[entry("a", 10.0), entry("b", 30.0)]);
        assert_eq!(summary.average, 20.0);
        assert_eq!(summary.count, 2);
    }

    #[test]
    fn upsert_replaces_same_reviewer() {
        let mut scores = vec![entry("a", 10.0), entry("b", 25.0)];
        upsert(&mut scores, entry("a", 35.0));

        assert_eq!(scores.len(), 2);
        let for_a: Vec<_> = scores.iter().filter(|s| s.admin_id == "a").collect();
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_a[0].total_score, 35.0);
    }

    #[test]
    fn validate_rejects_out_of_range_totals() {
        assert!(validate(&entry("a", 0.0)).is_ok());
        assert!(validate(&entry("a", 40.0)).is_ok());
        assert!(validate(&entry("a", 40.5)).is_err());
        assert!(validate(&entry("a", -1.0)).is_err());
        assert!(validate(&entry("a", f64::NAN)).is_err());
        assert!(validate(&entry("", 20.0)).is_err());
    }
}
