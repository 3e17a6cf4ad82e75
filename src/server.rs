use rmcp::model::{CallToolRequestParam, CallToolResult};
use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;
use crate::db::{RecordStore, SUBMISSIONS, SurrealStore, connect_db, healthcheck};
use crate::error::DeskError;
use crate::festival::crew::{self, CrewQuery};
use crate::festival::export;
use crate::festival::models::{ApplicationRecord, Language, ReviewStatus};
use crate::festival::normalize::normalize_submission;
use crate::festival::review::{self, NewScore};
use crate::festival::score;
use crate::festival::stats;

#[derive(Clone)]
pub struct FestivalMindServer {
    pub store: SurrealStore,
    pub cfg: Config,
}

/// User-facing failure text, per the dashboard's notification strings. The
/// technical detail rides separately for the developer log.
pub fn failure_message(lang: Language, err: &DeskError) -> &'static str {
    match err {
        DeskError::NotFound(_) => lang.pick("Application not found", "ไม่พบใบสมัครที่ระบุ"),
        DeskError::Store(_) => lang.pick(
            "Error loading application data",
            "เกิดข้อผิดพลาดในการโหลดข้อมูล",
        ),
        DeskError::InvalidScore(_) => {
            lang.pick("Error saving scores", "เกิดข้อผิดพลาดในการบันทึก")
        }
        DeskError::BadRequest(_) => lang.pick("Invalid request", "คำขอไม่ถูกต้อง"),
        DeskError::Export(_) => lang.pick("Export Failed", "การส่งออกล้มเหลว"),
    }
}

/// Pulls an optional `lang` argument without failing; defaults to English.
pub fn request_language(req: &CallToolRequestParam) -> Language {
    req.arguments
        .as_ref()
        .and_then(|args| args.get("lang"))
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApplicationArgs {
    id: String,
    /// When set, the response points out this reviewer's own score entry.
    #[serde(default)]
    admin_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CrewArgs {
    id: String,
    #[serde(flatten)]
    query: CrewQuery,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetStatusArgs {
    id: String,
    status: ReviewStatus,
    #[serde(default)]
    lang: Language,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetNotesArgs {
    id: String,
    notes: String,
    #[serde(default)]
    lang: Language,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetFlagArgs {
    id: String,
    flagged: bool,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    lang: Language,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitScoreArgs {
    id: String,
    admin_id: String,
    admin_name: String,
    #[serde(default)]
    criteria: std::collections::BTreeMap<String, f64>,
    total_score: f64,
    #[serde(default)]
    comments: Option<String>,
    #[serde(default)]
    lang: Language,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ExportFormat {
    Report,
    CrewCsv,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportArgs {
    id: String,
    format: ExportFormat,
    #[serde(default)]
    lang: Language,
}

fn parse_args<T: serde::de::DeserializeOwned>(
    req: &CallToolRequestParam,
) -> Result<T, DeskError> {
    let args = req.arguments.clone().unwrap_or_default();
    serde_json::from_value(Value::Object(args)).map_err(|e| DeskError::BadRequest(e.to_string()))
}

impl FestivalMindServer {
    pub async fn new(cfg: Config) -> anyhow::Result<Self> {
        let db = connect_db(&cfg).await?;
        Ok(Self {
            store: SurrealStore::new(db),
            cfg,
        })
    }

    async fn load_application(&self, id: &str) -> Result<ApplicationRecord, DeskError> {
        let raw = self
            .store
            .fetch_raw(SUBMISSIONS, id)
            .await?
            .ok_or_else(|| DeskError::NotFound(id.to_string()))?;
        Ok(normalize_submission(id, &raw))
    }

    /// Lightweight health tool: returns DB connectivity + config surface.
    pub async fn handle_health(
        &self,
        _req: CallToolRequestParam,
    ) -> Result<CallToolResult, DeskError> {
        let db_ok = healthcheck(self.store.handle()).await.unwrap_or(false);
        let body = serde_json::json!({
            "db": db_ok,
            "namespace": self.cfg.db_namespace,
            "database": self.cfg.db_name,
        });
        Ok(CallToolResult::structured(body))
    }

    /// Submission counts, total and per review status (best effort, errors
    /// become 0).
    pub async fn handle_status(
        &self,
        _req: CallToolRequestParam,
    ) -> Result<CallToolResult, DeskError> {
        let mut counts = serde_json::Map::new();
        counts.insert(
            "total".to_string(),
            serde_json::json!(self.store.count_all(SUBMISSIONS).await),
        );
        for status in ReviewStatus::ALL {
            let count = self
                .store
                .count_with_status(SUBMISSIONS, status.as_str())
                .await;
            counts.insert(status.as_str().to_string(), serde_json::json!(count));
        }

        Ok(CallToolResult::structured(Value::Object(counts)))
    }

    pub async fn handle_application(
        &self,
        req: CallToolRequestParam,
    ) -> Result<CallToolResult, DeskError> {
        let args: ApplicationArgs = parse_args(&req)?;
        let app = self.load_application(&args.id).await?;
        let summary = score::summarize(&app.scores);
        let my_score = args.admin_id.as_deref().and_then(|admin_id| {
            app.scores
                .iter()
                .find(|s| s.admin_id == admin_id)
                .cloned()
        });

        let body = serde_json::json!({
            "contact": app.contact_info(),
            "education": app.education(),
            "averageScore": summary.average,
            "scoreCount": summary.count,
            "myScore": my_score,
            "application": app,
        });
        Ok(CallToolResult::structured(body))
    }

    pub async fn handle_crew(
        &self,
        req: CallToolRequestParam,
    ) -> Result<CallToolResult, DeskError> {
        let args: CrewArgs = parse_args(&req)?;
        let app = self.load_application(&args.id).await?;
        let view = crew::filter_and_sort(&app.crew_members, &args.query);

        let body = serde_json::json!({
            "members": view.members,
            "hidden": view.hidden,
            "totalMatched": view.total_matched,
            "totalCrew": app.crew_members.len(),
        });
        Ok(CallToolResult::structured(body))
    }

    pub async fn handle_set_review_status(
        &self,
        req: CallToolRequestParam,
    ) -> Result<CallToolResult, DeskError> {
        let args: SetStatusArgs = parse_args(&req)?;
        let mut app = self.load_application(&args.id).await?;
        review::set_review_status(&self.store, &mut app, args.status).await?;

        let body = serde_json::json!({
            "message": args
                .lang
                .pick("Status updated successfully", "อัปเดตสถานะเรียบร้อย"),
            "application": app,
        });
        Ok(CallToolResult::structured(body))
    }

    pub async fn handle_set_admin_notes(
        &self,
        req: CallToolRequestParam,
    ) -> Result<CallToolResult, DeskError> {
        let args: SetNotesArgs = parse_args(&req)?;
        let mut app = self.load_application(&args.id).await?;
        review::set_admin_notes(&self.store, &mut app, args.notes).await?;

        let body = serde_json::json!({
            "message": args
                .lang
                .pick("Notes saved successfully", "บันทึกหมายเหตุเรียบร้อย"),
            "application": app,
        });
        Ok(CallToolResult::structured(body))
    }

    pub async fn handle_set_flag(
        &self,
        req: CallToolRequestParam,
    ) -> Result<CallToolResult, DeskError> {
        let args: SetFlagArgs = parse_args(&req)?;
        let mut app = self.load_application(&args.id).await?;
        review::set_flag(&self.store, &mut app, args.flagged, args.reason).await?;

        let message = if args.flagged {
            args.lang
                .pick("Application flagged successfully", "ตั้งค่าสถานะพิเศษเรียบร้อย")
        } else {
            args.lang.pick(
                "Application unflagged successfully",
                "ยกเลิกสถานะพิเศษเรียบร้อย",
            )
        };
        let body = serde_json::json!({
            "message": message,
            "application": app,
        });
        Ok(CallToolResult::structured(body))
    }

    pub async fn handle_submit_score(
        &self,
        req: CallToolRequestParam,
    ) -> Result<CallToolResult, DeskError> {
        let args: SubmitScoreArgs = parse_args(&req)?;
        let mut app = self.load_application(&args.id).await?;
        review::upsert_score(
            &self.store,
            &mut app,
            NewScore {
                admin_id: args.admin_id,
                admin_name: args.admin_name,
                criteria: args.criteria,
                total_score: args.total_score,
                comments: args.comments,
            },
        )
        .await?;

        let summary = score::summarize(&app.scores);
        let body = serde_json::json!({
            "message": args
                .lang
                .pick("Scores saved successfully", "บันทึกคะแนนเรียบร้อย"),
            "averageScore": summary.average,
            "scoreCount": summary.count,
            "application": app,
        });
        Ok(CallToolResult::structured(body))
    }

    pub async fn handle_export(
        &self,
        req: CallToolRequestParam,
    ) -> Result<CallToolResult, DeskError> {
        let args: ExportArgs = parse_args(&req)?;
        let app = self.load_application(&args.id).await?;

        let document = match args.format {
            ExportFormat::Report => export::application_report(&app, args.lang),
            ExportFormat::CrewCsv => export::crew_csv(&app).map_err(|e| {
                tracing::error!("export failed");
                e
            })?,
        };

        let body = serde_json::json!({
            "message": args.lang.pick("Export Successful", "ส่งออกสำเร็จ"),
            "document": document,
        });
        Ok(CallToolResult::structured(body))
    }

    pub async fn handle_genre_stats(
        &self,
        _req: CallToolRequestParam,
    ) -> Result<CallToolResult, DeskError> {
        let rows = self.store.list_raw(SUBMISSIONS).await?;
        let apps: Vec<ApplicationRecord> = rows
            .iter()
            .map(|(id, raw)| normalize_submission(id, raw))
            .collect();
        let genres = stats::genre_distribution(&apps);

        let body = serde_json::json!({
            "genres": genres,
            "applications": apps.len(),
        });
        Ok(CallToolResult::structured(body))
    }
}
