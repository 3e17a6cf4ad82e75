use thiserror::Error;

/// Failure taxonomy for desk operations. Everything is caught at the
/// operation boundary and turned into a user-facing notification; nothing
/// propagates far enough to take the server down.
#[derive(Debug, Error)]
pub enum DeskError {
    /// The requested application id has no document in the store.
    #[error("application {0} not found")]
    NotFound(String),

    /// Read or write against the document store failed.
    #[error("store error: {0}")]
    Store(String),

    /// A score outside the accepted range (or with a missing reviewer id).
    #[error("invalid score: {0}")]
    InvalidScore(String),

    /// Malformed tool arguments.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Export document could not be produced.
    #[error("export failed: {0}")]
    Export(String),
}

impl From<surrealdb::Error> for DeskError {
    fn from(err: surrealdb::Error) -> Self {
        DeskError::Store(err.to_string())
    }
}

