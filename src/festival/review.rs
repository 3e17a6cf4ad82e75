//! The four review mutations. Each follows the same shape: read the
//! persisted document, compute a minimal patch, merge it with a refreshed
//! `lastModified` (plus `lastReviewedAt` for review actions), then mirror
//! the change into the caller's in-memory record. The mirror step runs only
//! after a successful write, so a failed mutation leaves the local record
//! exactly as it was. One attempt, no retry; last-write-wins at the store.

use std::collections::BTreeMap;

use chrono::Utc;
use serde_json::{Value, json};

use crate::db::{RecordStore, SUBMISSIONS};
use crate::error::DeskError;
use crate::festival::models::{ApplicationRecord, ReviewStatus, ScoreEntry};
use crate::festival::normalize::normalize_submission;
use crate::festival::score;

/// One reviewer's score submission. Identity is explicit here rather than
/// read from ambient context; `scored_at` is stamped by the operation.
#[derive(Debug, Clone)]
pub struct NewScore {
    pub admin_id: String,
    pub admin_name: String,
    pub criteria: BTreeMap<String, f64>,
    pub total_score: f64,
    pub comments: Option<String>,
}

pub async fn set_review_status<S: RecordStore + ?Sized>(
    store: &S,
    app: &mut ApplicationRecord,
    status: ReviewStatus,
) -> Result<(), DeskError> {
    require_existing(store, &app.id).await?;

    let now = Utc::now();
    let patch = json!({
        "reviewStatus": status,
        "lastReviewedAt": now,
        "lastModified": now,
    });
    store.merge(SUBMISSIONS, &app.id, patch).await?;

    app.review_status = status;
    app.last_reviewed_at = Some(now);
    app.last_modified = now;
    Ok(())
}

pub async fn set_admin_notes<S: RecordStore + ?Sized>(
    store: &S,
    app: &mut ApplicationRecord,
    notes: String,
) -> Result<(), DeskError> {
    require_existing(store, &app.id).await?;

    let now = Utc::now();
    let patch = json!({
        "adminNotes": notes,
        "lastModified": now,
    });
    store.merge(SUBMISSIONS, &app.id, patch).await?;

    app.admin_notes = notes;
    app.last_modified = now;
    Ok(())
}

/// Clearing the flag always clears the reason, whether or not a reason
/// argument was passed. Flagging writes a reason only when one is supplied.
pub async fn set_flag<S: RecordStore + ?Sized>(
    store: &S,
    app: &mut ApplicationRecord,
    flagged: bool,
    reason: Option<String>,
) -> Result<(), DeskError> {
    require_existing(store, &app.id).await?;

    let now = Utc::now();
    let mut patch = json!({
        "flagged": flagged,
        "lastModified": now,
    });
    match (flagged, &reason) {
        (true, Some(r)) => patch["flagReason"] = json!(r),
        (true, None) => {}
        (false, _) => patch["flagReason"] = Value::Null,
    }
    store.merge(SUBMISSIONS, &app.id, patch).await?;

    app.flagged = flagged;
    if flagged {
        if reason.is_some() {
            app.flag_reason = reason;
        }
    } else {
        app.flag_reason = None;
    }
    app.last_modified = now;
    Ok(())
}

/// Upserts one reviewer's score: re-reads the persisted score list, drops
/// any entry with the same reviewer id, appends the new entry stamped with
/// `scoredAt = now`, and writes the whole list back.
pub async fn upsert_score<S: RecordStore + ?Sized>(
    store: &S,
    app: &mut ApplicationRecord,
    new: NewScore,
) -> Result<(), DeskError> {
    let now = Utc::now();
    let entry = ScoreEntry {
        admin_id: new.admin_id,
        admin_name: new.admin_name,
        criteria: new.criteria,
        total_score: new.total_score,
        comments: new.comments,
        scored_at: now,
    };
    score::validate(&entry)?;

    let raw = store
        .fetch_raw(SUBMISSIONS, &app.id)
        .await?
        .ok_or_else(|| DeskError::NotFound(app.id.clone()))?;
    let mut persisted_scores = normalize_submission(&app.id, &raw).scores;
    score::upsert(&mut persisted_scores, entry.clone());

    let patch = json!({
        "scores": persisted_scores,
        "lastReviewedAt": now,
        "lastModified": now,
    });
    store.merge(SUBMISSIONS, &app.id, patch).await?;

    score::upsert(&mut app.scores, entry);
    app.last_reviewed_at = Some(now);
    app.last_modified = now;
    Ok(())
}

async fn require_existing<S: RecordStore + ?Sized>(store: &S, id: &str) -> Result<(), DeskError> {
    store
        .fetch_raw(SUBMISSIONS, id)
        .await?
        .map(|_| ())
        .ok_or_else(|| DeskError::NotFound(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// In-memory store with the same shallow-merge, last-write-wins
    /// behavior as the production binding. `fail_writes` injects a store
    /// failure on merge.
    struct MemStore {
        doc: Mutex<Option<Value>>,
        fail_writes: bool,
    }

    impl MemStore {
        fn with_doc(doc: Value) -> Self {
            Self {
                doc: Mutex::new(Some(doc)),
                fail_writes: false,
            }
        }

        fn failing(doc: Value) -> Self {
            Self {
                doc: Mutex::new(Some(doc)),
                fail_writes: true,
            }
        }

        fn empty() -> Self {
            Self {
                doc: Mutex::new(None),
                fail_writes: false,
            }
        }

        fn snapshot(&self) -> Option<Value> {
            self.doc.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RecordStore for MemStore {
        async fn fetch_raw(&self, _collection: &str, _id: &str) -> Result<Option<Value>, DeskError> {
            Ok(self.snapshot())
        }

        async fn merge(&self, _collection: &str, id: &str, patch: Value) -> Result<(), DeskError> {
            if self.fail_writes {
                return Err(DeskError::Store("injected write failure".to_string()));
            }
            let mut guard = self.doc.lock().unwrap();
            let Some(doc) = guard.as_mut() else {
                return Err(DeskError::NotFound(id.to_string()));
            };
            let (Some(target), Some(fields)) = (doc.as_object_mut(), patch.as_object()) else {
                return Err(DeskError::Store("malformed patch".to_string()));
            };
            for (k, v) in fields {
                target.insert(k.clone(), v.clone());
            }
            Ok(())
        }

        async fn list_raw(&self, _collection: &str) -> Result<Vec<(String, Value)>, DeskError> {
            Ok(self
                .snapshot()
                .map(|doc| vec![("app-1".to_string(), doc)])
                .unwrap_or_default())
        }
    }

    fn base_doc() -> Value {
        json!({
            "filmTitle": "Lanna Lights",
            "reviewStatus": "pending",
            "flagged": true,
            "flagReason": "duplicate entry",
            "scores": [],
            "createdAt": "2025-06-01T10:00:00Z",
            "lastModified": "2025-06-01T10:00:00Z",
        })
    }

    fn load(store: &MemStore) -> ApplicationRecord {
        normalize_submission("app-1", &store.snapshot().unwrap())
    }

    fn new_score(admin_id: &str, total: f64) -> NewScore {
        NewScore {
            admin_id: admin_id.to_string(),
            admin_name: format!("Judge {admin_id}"),
            criteria: BTreeMap::new(),
            total_score: total,
            comments: None,
        }
    }

    #[tokio::test]
    async fn set_review_status_persists_and_mirrors() {
        let store = MemStore::with_doc(base_doc());
        let mut app = load(&store);

        set_review_status(&store, &mut app, ReviewStatus::Approved)
            .await
            .unwrap();

        assert_eq!(app.review_status, ReviewStatus::Approved);
        assert!(app.last_reviewed_at.is_some());
        let doc = store.snapshot().unwrap();
        assert_eq!(doc["reviewStatus"], json!("approved"));
        assert!(doc["lastReviewedAt"].is_string());
    }

    #[tokio::test]
    async fn missing_document_is_not_found() {
        let store = MemStore::empty();
        let mut app = normalize_submission("app-1", &json!({}));

        let err = set_admin_notes(&store, &mut app, "hi".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::NotFound(_)));
    }

    #[tokio::test]
    async fn clearing_flag_always_clears_reason() {
        let store = MemStore::with_doc(base_doc());
        let mut app = load(&store);
        assert_eq!(app.flag_reason.as_deref(), Some("duplicate entry"));

        set_flag(&store, &mut app, false, None).await.unwrap();

        assert!(!app.flagged);
        assert_eq!(app.flag_reason, None);
        let doc = store.snapshot().unwrap();
        assert_eq!(doc["flagged"], json!(false));
        assert!(doc["flagReason"].is_null());
    }

    #[tokio::test]
    async fn flagging_without_reason_keeps_stored_reason() {
        let store = MemStore::with_doc(base_doc());
        let mut app = load(&store);

        set_flag(&store, &mut app, true, None).await.unwrap();

        let doc = store.snapshot().unwrap();
        assert_eq!(doc["flagReason"], json!("duplicate entry"));
        assert_eq!(app.flag_reason.as_deref(), Some("duplicate entry"));
    }

    #[tokio::test]
    async fn upsert_score_replaces_entry_for_same_reviewer() {
        let store = MemStore::with_doc(base_doc());
        let mut app = load(&store);

        upsert_score(&store, &mut app, new_score("admin-1", 22.0))
            .await
            .unwrap();
        upsert_score(&store, &mut app, new_score("admin-1", 31.0))
            .await
            .unwrap();

        assert_eq!(app.scores.len(), 1);
        assert_eq!(app.scores[0].total_score, 31.0);

        let doc = store.snapshot().unwrap();
        let stored = doc["scores"].as_array().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0]["totalScore"], json!(31.0));
        assert_eq!(stored[0]["adminId"], json!("admin-1"));
    }

    #[tokio::test]
    async fn upsert_score_folds_in_other_reviewers_from_store() {
        // Another reviewer's entry landed between this caller's read and
        // write; the re-read inside the operation must preserve it.
        let store = MemStore::with_doc(base_doc());
        let mut app = load(&store);

        upsert_score(&store, &mut app, new_score("admin-2", 18.0))
            .await
            .unwrap();

        let other = MemStore::with_doc(store.snapshot().unwrap());
        let mut stale = normalize_submission("app-1", &base_doc());
        upsert_score(&other, &mut stale, new_score("admin-3", 28.0))
            .await
            .unwrap();

        let doc = other.snapshot().unwrap();
        assert_eq!(doc["scores"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failed_write_leaves_local_record_untouched() {
        let store = MemStore::failing(base_doc());
        let mut app = load(&store);
        let before = app.clone();

        assert!(
            set_review_status(&store, &mut app, ReviewStatus::Rejected)
                .await
                .is_err()
        );
        assert_eq!(app, before);

        assert!(
            set_admin_notes(&store, &mut app, "notes".to_string())
                .await
                .is_err()
        );
        assert_eq!(app, before);

        assert!(set_flag(&store, &mut app, false, None).await.is_err());
        assert_eq!(app, before);

        assert!(
            upsert_score(&store, &mut app, new_score("admin-9", 12.0))
                .await
                .is_err()
        );
        assert_eq!(app, before);
    }

    #[tokio::test]
    async fn out_of_range_score_is_rejected_before_any_write() {
        let store = MemStore::with_doc(base_doc());
        let mut app = load(&store);
        let before_doc = store.snapshot();

        let err = upsert_score(&store, &mut app, new_score("admin-1", 55.0))
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::InvalidScore(_)));
        assert_eq!(store.snapshot(), before_doc);
        assert!(app.scores.is_empty());
    }
}
