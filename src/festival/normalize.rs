//! Raw store documents use inconsistent field names across two historical
//! schema generations (`submitter*` vs `director*`, `downloadURL` vs `url`,
//! criterion fields spread into score entries vs nested under `criteria`).
//! Everything is resolved here, once, through ordered fallback tables; the
//! rest of the crate only ever sees a fully-populated `ApplicationRecord`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::festival::models::{
    ApplicationRecord, CompetitionCategory, CrewMember, FileRef, FileSet, FilmFormat, ReviewStatus,
    ScoreEntry,
};

/// Converts one raw submission document into the canonical view model.
/// Field lookups apply, in order: new-schema name, legacy name where one
/// exists, then a type-appropriate default. Never fails; absent or
/// malformed fields simply take their defaults.
pub fn normalize_submission(doc_id: &str, raw: &Value) -> ApplicationRecord {
    let now = Utc::now();
    let created_at = time_at(raw, &["createdAt"]).unwrap_or(now);

    ApplicationRecord {
        id: doc_id.to_string(),
        application_id: str_or(raw, &["applicationId"], doc_id),
        user_id: str_at(raw, &["userId"]),
        competition_category: enum_at(raw, &["competitionCategory", "category"]),

        film_title: str_or(raw, &["filmTitle"], "Untitled"),
        film_title_th: opt_str_at(raw, &["filmTitleTh"]),
        genres: string_list_at(raw, &["genres"]),
        format: enum_at(raw, &["format"]),
        duration: num_at(raw, &["duration"]) as u32,
        synopsis: str_at(raw, &["synopsis"]),
        chiangmai_connection: opt_str_at(raw, &["chiangmaiConnection"]),
        nationality: str_or(raw, &["nationality"], "Unknown"),

        submitter_name: str_at(raw, &["submitterName", "directorName"]),
        submitter_name_th: opt_str_at(raw, &["submitterNameTh", "directorNameTh"]),
        submitter_age: opt_num_at(raw, &["submitterAge", "directorAge"]).map(|n| n as u32),
        submitter_phone: str_at(raw, &["submitterPhone", "directorPhone"]),
        submitter_email: str_at(raw, &["submitterEmail", "directorEmail"]),
        submitter_role: str_at(raw, &["submitterRole", "directorRole"]),
        submitter_custom_role: opt_str_at(raw, &["submitterCustomRole", "directorCustomRole"]),

        school_name: opt_str_at(raw, &["schoolName"]),
        student_id: opt_str_at(raw, &["studentId"]),
        university_name: opt_str_at(raw, &["universityName"]),
        faculty: opt_str_at(raw, &["faculty"]),
        university_id: opt_str_at(raw, &["universityId"]),

        files: FileSet {
            film_file: file_ref(raw.pointer("/files/filmFile"), "Film file"),
            poster_file: file_ref(raw.pointer("/files/posterFile"), "Poster file"),
            proof_file: raw
                .pointer("/files/proofFile")
                .filter(|v| v.is_object())
                .map(|v| file_ref(Some(v), "Proof file")),
        },
        crew_members: raw
            .get("crewMembers")
            .and_then(Value::as_array)
            .map(|members| members.iter().map(normalize_crew_member).collect())
            .unwrap_or_default(),

        scores: raw
            .get("scores")
            .and_then(Value::as_array)
            .map(|entries| entries.iter().filter_map(normalize_score).collect())
            .unwrap_or_default(),
        admin_notes: str_at(raw, &["adminNotes"]),
        review_status: enum_at(raw, &["reviewStatus"]),
        flagged: raw.get("flagged").and_then(Value::as_bool).unwrap_or(false),
        flag_reason: opt_str_at(raw, &["flagReason"]),

        created_at,
        last_modified: time_at(raw, &["lastModified"]).unwrap_or(created_at),
        submitted_at: time_at(raw, &["submittedAt"]),
        last_reviewed_at: time_at(raw, &["lastReviewedAt"]),
    }
}

fn normalize_crew_member(raw: &Value) -> CrewMember {
    CrewMember {
        id: str_at(raw, &["id"]),
        full_name: str_at(raw, &["fullName"]),
        full_name_th: opt_str_at(raw, &["fullNameTh"]),
        role: str_at(raw, &["role"]),
        custom_role: opt_str_at(raw, &["customRole"]),
        age: num_at(raw, &["age"]) as u32,
        phone: opt_str_at(raw, &["phone"]),
        email: opt_str_at(raw, &["email"]),
        school_name: opt_str_at(raw, &["schoolName"]),
        student_id: opt_str_at(raw, &["studentId"]),
    }
}

/// Entries without a reviewer id are unattributable and dropped. Sub-scores
/// live under `criteria` in the current generation; the legacy generation
/// spread them as top-level numeric fields next to `totalScore`.
fn normalize_score(raw: &Value) -> Option<ScoreEntry> {
    let admin_id = str_at(raw, &["adminId"]);
    if admin_id.is_empty() {
        return None;
    }

    let criteria: BTreeMap<String, f64> = match raw.get("criteria").and_then(Value::as_object) {
        Some(map) => map
            .iter()
            .filter_map(|(k, v)| v.as_f64().map(|n| (k.clone(), n)))
            .collect(),
        None => raw
            .as_object()
            .map(|map| {
                map.iter()
                    .filter(|(k, _)| k.as_str() != "totalScore" && k.as_str() != "scoredAt")
                    .filter_map(|(k, v)| v.as_f64().map(|n| (k.clone(), n)))
                    .collect()
            })
            .unwrap_or_default(),
    };

    Some(ScoreEntry {
        admin_id,
        admin_name: str_at(raw, &["adminName"]),
        criteria,
        total_score: raw
            .get("totalScore")
            .and_then(Value::as_f64)
            .unwrap_or(0.0),
        comments: opt_str_at(raw, &["comments"]),
        scored_at: time_at(raw, &["scoredAt"]).unwrap_or_else(Utc::now),
    })
}

fn file_ref(raw: Option<&Value>, default_name: &str) -> FileRef {
    let Some(raw) = raw else {
        return FileRef {
            name: default_name.to_string(),
            ..FileRef::default()
        };
    };
    FileRef {
        url: str_at(raw, &["downloadURL", "url"]),
        name: str_or(raw, &["fileName", "name"], default_name),
        size: num_at(raw, &["fileSize", "size"]),
    }
}

/// First key whose value is a non-empty string.
fn opt_str_at(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| raw.get(k))
        .filter_map(Value::as_str)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn str_at(raw: &Value, keys: &[&str]) -> String {
    opt_str_at(raw, keys).unwrap_or_default()
}

fn str_or(raw: &Value, keys: &[&str], default: &str) -> String {
    opt_str_at(raw, keys).unwrap_or_else(|| default.to_string())
}

/// First key holding a number; negative values clamp to zero since every
/// numeric field here is a count, size, or age.
fn opt_num_at(raw: &Value, keys: &[&str]) -> Option<u64> {
    keys.iter()
        .filter_map(|k| raw.get(k))
        .find_map(Value::as_f64)
        .map(|n| if n.is_sign_negative() { 0 } else { n as u64 })
}

fn num_at(raw: &Value, keys: &[&str]) -> u64 {
    opt_num_at(raw, keys).unwrap_or(0)
}

fn string_list_at(raw: &Value, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .filter_map(|k| raw.get(k))
        .find_map(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Enum wire strings parse through serde; unknown values take the enum's
/// default so a read never fails.
fn enum_at<T>(raw: &Value, keys: &[&str]) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    opt_str_at(raw, keys)
        .and_then(|s| serde_json::from_value(Value::String(s)).ok())
        .unwrap_or_default()
}

/// Store-native datetimes arrive as RFC 3339 strings; epoch milliseconds
/// are tolerated as a legacy form.
fn time_at(raw: &Value, keys: &[&str]) -> Option<DateTime<Utc>> {
    let value = keys.iter().find_map(|k| raw.get(k))?;
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_optional_fields_take_documented_defaults() {
        let app = normalize_submission("sub-1", &json!({}));

        assert_eq!(app.id, "sub-1");
        assert_eq!(app.application_id, "sub-1");
        assert_eq!(app.film_title, "Untitled");
        assert_eq!(app.duration, 0);
        assert!(app.genres.is_empty());
        assert!(app.crew_members.is_empty());
        assert!(app.scores.is_empty());
        assert_eq!(app.competition_category, CompetitionCategory::Youth);
        assert_eq!(app.format, FilmFormat::LiveAction);
        assert_eq!(app.review_status, ReviewStatus::Pending);
        assert!(!app.flagged);
        assert_eq!(app.nationality, "Unknown");
        assert_eq!(app.files.film_file.name, "Film file");
        assert_eq!(app.files.film_file.size, 0);
        assert!(app.files.proof_file.is_none());
        // A record with no timestamps must still sort chronologically.
        assert_eq!(app.last_modified, app.created_at);
    }

    #[test]
    fn legacy_director_fields_populate_submitter_fields() {
        let raw = json!({
            "competitionCategory": "world",
            "directorName": "Akira Tanaka",
            "directorNameTh": "อากิระ",
            "directorAge": 34,
            "directorPhone": "+81-90-0000-0000",
            "directorEmail": "akira@example.com",
            "directorRole": "Director",
        });
        let app = normalize_submission("sub-2", &raw);

        assert_eq!(app.competition_category, CompetitionCategory::World);
        assert_eq!(app.submitter_name, "Akira Tanaka");
        assert_eq!(app.submitter_name_th.as_deref(), Some("อากิระ"));
        assert_eq!(app.submitter_age, Some(34));
        assert_eq!(app.submitter_phone, "+81-90-0000-0000");
        assert_eq!(app.submitter_email, "akira@example.com");
        assert_eq!(app.submitter_role, "Director");
    }

    #[test]
    fn new_schema_wins_over_legacy() {
        let raw = json!({
            "submitterName": "New Name",
            "directorName": "Old Name",
        });
        assert_eq!(normalize_submission("x", &raw).submitter_name, "New Name");
    }

    #[test]
    fn empty_new_field_falls_back_to_legacy() {
        let raw = json!({
            "submitterName": "",
            "directorName": "Old Name",
        });
        assert_eq!(normalize_submission("x", &raw).submitter_name, "Old Name");
    }

    #[test]
    fn file_group_resolves_both_generations() {
        let raw = json!({
            "files": {
                "filmFile": {
                    "downloadURL": "https://blob/film.mp4",
                    "fileName": "film.mp4",
                    "fileSize": 1048576,
                },
                "posterFile": {
                    "url": "https://blob/poster.png",
                    "name": "poster.png",
                    "size": 2048,
                },
            }
        });
        let app = normalize_submission("x", &raw);

        assert_eq!(app.files.film_file.url, "https://blob/film.mp4");
        assert_eq!(app.files.film_file.size, 1_048_576);
        assert_eq!(app.files.poster_file.url, "https://blob/poster.png");
        assert_eq!(app.files.poster_file.name, "poster.png");
        assert_eq!(app.files.poster_file.size, 2048);
        assert!(app.files.proof_file.is_none());
    }

    #[test]
    fn proof_file_survives_when_present() {
        let raw = json!({
            "files": { "proofFile": { "url": "https://blob/proof.pdf" } }
        });
        let proof = normalize_submission("x", &raw).files.proof_file.unwrap();
        assert_eq!(proof.url, "https://blob/proof.pdf");
        assert_eq!(proof.name, "Proof file");
    }

    #[test]
    fn timestamps_parse_rfc3339_and_epoch_millis() {
        let raw = json!({
            "createdAt": "2025-06-01T10:00:00Z",
            "lastModified": 1_748_772_000_000_i64,
        });
        let app = normalize_submission("x", &raw);
        assert_eq!(app.created_at.to_rfc3339(), "2025-06-01T10:00:00+00:00");
        assert_eq!(
            app.last_modified,
            DateTime::from_timestamp_millis(1_748_772_000_000).unwrap()
        );
    }

    #[test]
    fn legacy_spread_scores_fold_into_criteria() {
        let raw = json!({
            "scores": [
                {
                    "adminId": "admin-1",
                    "adminName": "Judge A",
                    "story": 8.0,
                    "technique": 7.5,
                    "totalScore": 31.0,
                    "scoredAt": "2025-06-02T09:00:00Z",
                },
                {
                    "adminId": "admin-2",
                    "adminName": "Judge B",
                    "criteria": { "story": 9.0 },
                    "totalScore": 36.0,
                },
                { "adminName": "no id, dropped" },
            ]
        });
        let app = normalize_submission("x", &raw);

        assert_eq!(app.scores.len(), 2);
        assert_eq!(app.scores[0].criteria.get("story"), Some(&8.0));
        assert_eq!(app.scores[0].criteria.get("technique"), Some(&7.5));
        assert!(!app.scores[0].criteria.contains_key("totalScore"));
        assert_eq!(app.scores[1].criteria.get("story"), Some(&9.0));
        assert_eq!(app.scores[1].total_score, 36.0);
    }

    #[test]
    fn unknown_enum_strings_default_instead_of_failing() {
        let raw = json!({
            "competitionCategory": "galactic",
            "format": "diorama",
            "reviewStatus": "archived",
        });
        let app = normalize_submission("x", &raw);
        assert_eq!(app.competition_category, CompetitionCategory::Youth);
        assert_eq!(app.format, FilmFormat::LiveAction);
        assert_eq!(app.review_status, ReviewStatus::Pending);
    }
}
