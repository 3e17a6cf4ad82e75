use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use surrealdb::{
    Surreal,
    engine::remote::ws::{Client, Ws},
    opt::auth::Root,
};

use crate::config::Config;
use crate::error::DeskError;

/// Collection holding one document per festival application.
pub const SUBMISSIONS: &str = "submissions";

pub async fn connect_db(cfg: &Config) -> Result<Surreal<Client>> {
    // Surreal expects host:port without scheme for Ws; strip ws:// or wss:// if present.
    let addr = cfg
        .db_url
        .trim_start_matches("ws://")
        .trim_start_matches("wss://")
        .to_string();

    let db = Surreal::new::<Ws>(&addr).await?;
    db.signin(Root {
        username: &cfg.db_user,
        password: &cfg.db_pass,
    })
    .await?;
    db.use_ns(&cfg.db_namespace).use_db(&cfg.db_name).await?;
    Ok(db)
}

pub async fn healthcheck(db: &Surreal<Client>) -> Result<bool> {
    // simple ping via info query
    let mut res = db.query("RETURN 1;").await?;
    let val: Option<i32> = res.take(0)?;
    Ok(val == Some(1))
}

/// The slice of the document store the review desk depends on: fetch one
/// raw document, merge a partial patch into one, list a collection. Merge
/// semantics are last-write-wins; there is no compare-and-set and no
/// transaction around a read-then-write.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn fetch_raw(&self, collection: &str, id: &str) -> Result<Option<Value>, DeskError>;

    /// Applies `patch` to an existing document. Fails with `NotFound` when
    /// the document does not exist; a patch never creates one.
    async fn merge(&self, collection: &str, id: &str, patch: Value) -> Result<(), DeskError>;

    async fn list_raw(&self, collection: &str) -> Result<Vec<(String, Value)>, DeskError>;
}

#[derive(Clone)]
pub struct SurrealStore {
    db: Surreal<Client>,
}

impl SurrealStore {
    pub fn new(db: Surreal<Client>) -> Self {
        Self { db }
    }

    pub fn handle(&self) -> &Surreal<Client> {
        &self.db
    }

    /// Best-effort count; errors become 0 so the status surface stays up
    /// even when the table does not exist yet.
    pub async fn count_all(&self, collection: &str) -> i64 {
        let query = format!("SELECT count() FROM {collection} GROUP ALL;");
        self.db
            .query(query)
            .await
            .ok()
            .and_then(|mut res| res.take::<Option<i64>>((0, "count")).ok())
            .flatten()
            .unwrap_or(0)
    }

    pub async fn count_with_status(&self, collection: &str, status: &str) -> i64 {
        let query =
            format!("SELECT count() FROM {collection} WHERE reviewStatus = $status GROUP ALL;");
        self.db
            .query(query)
            .bind(("status", status.to_string()))
            .await
            .ok()
            .and_then(|mut res| res.take::<Option<i64>>((0, "count")).ok())
            .flatten()
            .unwrap_or(0)
    }
}

#[async_trait]
impl RecordStore for SurrealStore {
    async fn fetch_raw(&self, collection: &str, id: &str) -> Result<Option<Value>, DeskError> {
        let mut res = self
            .db
            .query("SELECT * OMIT id FROM type::thing($tb, $id);")
            .bind(("tb", collection.to_string()))
            .bind(("id", id.to_string()))
            .await?;
        let doc: Option<Value> = res.take(0)?;
        Ok(doc)
    }

    async fn merge(&self, collection: &str, id: &str, patch: Value) -> Result<(), DeskError> {
        let mut res = self
            .db
            .query("UPDATE type::thing($tb, $id) MERGE $patch RETURN AFTER;")
            .bind(("tb", collection.to_string()))
            .bind(("id", id.to_string()))
            .bind(("patch", patch))
            .await?;
        let updated: Option<Value> = res.take(0)?;
        match updated {
            Some(_) => Ok(()),
            None => Err(DeskError::NotFound(id.to_string())),
        }
    }

    async fn list_raw(&self, collection: &str) -> Result<Vec<(String, Value)>, DeskError> {
        let mut res = self
            .db
            .query("SELECT *, record::id(id) AS docId OMIT id FROM type::table($tb);")
            .bind(("tb", collection.to_string()))
            .await?;
        let rows: Vec<Value> = res.take(0)?;
        Ok(rows
            .into_iter()
            .map(|mut row| {
                let doc_id = row
                    .get("docId")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                if let Some(map) = row.as_object_mut() {
                    map.remove("docId");
                }
                (doc_id, row)
            })
            .collect())
    }
}
