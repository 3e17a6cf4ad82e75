use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Language the caller wants user-facing text in. The logic never branches
/// semantically on this beyond picking which pre-translated string to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Th,
}

impl Language {
    pub fn pick<'a>(&self, en: &'a str, th: &'a str) -> &'a str {
        match self {
            Language::En => en,
            Language::Th => th,
        }
    }

    /// Prefers a localized value when present, otherwise the primary one.
    pub fn pick_name<'a>(&self, primary: &'a str, localized: Option<&'a str>) -> &'a str {
        match (self, localized) {
            (Language::Th, Some(th)) if !th.is_empty() => th,
            _ => primary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetitionCategory {
    #[default]
    Youth,
    Future,
    World,
}

impl CompetitionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompetitionCategory::Youth => "youth",
            CompetitionCategory::Future => "future",
            CompetitionCategory::World => "world",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilmFormat {
    #[default]
    LiveAction,
    Animation,
}

impl FilmFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilmFormat::LiveAction => "live-action",
            FilmFormat::Animation => "animation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewStatus {
    #[default]
    Pending,
    InProgress,
    Reviewed,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub const ALL: [ReviewStatus; 5] = [
        ReviewStatus::Pending,
        ReviewStatus::InProgress,
        ReviewStatus::Reviewed,
        ReviewStatus::Approved,
        ReviewStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::InProgress => "in-progress",
            ReviewStatus::Reviewed => "reviewed",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }
}

/// One named file reference on a submission. URLs point at blob storage and
/// are consumed read-only.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    pub url: String,
    pub name: String,
    pub size: u64,
}

impl FileRef {
    /// `true` when the blob URL is present, mirroring the dashboard's
    /// verified/missing file badge.
    pub fn is_present(&self) -> bool {
        !self.url.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSet {
    pub film_file: FileRef,
    pub poster_file: FileRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_file: Option<FileRef>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrewMember {
    pub id: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name_th: Option<String>,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_role: Option<String>,
    pub age: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
}

impl CrewMember {
    pub fn display_name(&self, lang: Language) -> &str {
        lang.pick_name(&self.full_name, self.full_name_th.as_deref())
    }

    /// "Other" roles carry the actual role in `custom_role`.
    pub fn display_role(&self) -> &str {
        match (self.role.as_str(), self.custom_role.as_deref()) {
            ("Other", Some(custom)) if !custom.is_empty() => custom,
            _ => &self.role,
        }
    }
}

/// One reviewer's assessment. At most one entry per `admin_id` exists in an
/// application's score list; a resubmission replaces the previous entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub admin_id: String,
    pub admin_name: String,
    /// Per-criterion sub-scores, keyed by criterion name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub criteria: BTreeMap<String, f64>,
    pub total_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    pub scored_at: DateTime<Utc>,
}

/// Canonical, fully-populated view of one submission. Produced by
/// `normalize::normalize_submission`; every required field is defined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    pub id: String,
    pub application_id: String,
    pub user_id: String,
    pub competition_category: CompetitionCategory,

    pub film_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub film_title_th: Option<String>,
    pub genres: Vec<String>,
    pub format: FilmFormat,
    /// Minutes.
    pub duration: u32,
    pub synopsis: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chiangmai_connection: Option<String>,
    pub nationality: String,

    pub submitter_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitter_name_th: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitter_age: Option<u32>,
    pub submitter_phone: String,
    pub submitter_email: String,
    pub submitter_role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitter_custom_role: Option<String>,

    // Category-specific education fields: school for youth, university for
    // future; world submissions carry neither.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub university_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faculty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub university_id: Option<String>,

    pub files: FileSet,
    pub crew_members: Vec<CrewMember>,

    pub scores: Vec<ScoreEntry>,
    pub admin_notes: String,
    pub review_status: ReviewStatus,
    pub flagged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag_reason: Option<String>,

    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

/// Submitter identity block as the dashboard presents it. The legacy
/// `director*` generation has already been folded in by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_th: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    pub phone: &'a str,
    pub email: &'a str,
    pub role: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_role: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum Education<'a> {
    #[serde(rename = "school")]
    School { institution: &'a str, id: &'a str },
    #[serde(rename = "university")]
    University {
        institution: &'a str,
        faculty: &'a str,
        id: &'a str,
    },
}

impl ApplicationRecord {
    pub fn contact_info(&self) -> ContactInfo<'_> {
        ContactInfo {
            name: &self.submitter_name,
            name_th: self.submitter_name_th.as_deref(),
            age: self.submitter_age,
            phone: &self.submitter_phone,
            email: &self.submitter_email,
            role: &self.submitter_role,
            custom_role: self.submitter_custom_role.as_deref(),
        }
    }

    /// Education block by category; `world` submissions have none.
    pub fn education(&self) -> Option<Education<'_>> {
        match self.competition_category {
            CompetitionCategory::Youth => Some(Education::School {
                institution: self.school_name.as_deref().unwrap_or(""),
                id: self.student_id.as_deref().unwrap_or(""),
            }),
            CompetitionCategory::Future => Some(Education::University {
                institution: self.university_name.as_deref().unwrap_or(""),
                faculty: self.faculty.as_deref().unwrap_or(""),
                id: self.university_id.as_deref().unwrap_or(""),
            }),
            CompetitionCategory::World => None,
        }
    }

    pub fn display_title(&self, lang: Language) -> &str {
        lang.pick_name(&self.film_title, self.film_title_th.as_deref())
    }
}
