//! Error taxonomy shared by the store, index and ingest paths.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed caller input (bad pagination, invalid ids, bad segment
    /// ordering). No state was changed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unknown channel or video. No state was changed.
    #[error("not found: {0}")]
    NotFound(String),

    /// A write-path failure. The affected video is left in the failed state
    /// and can be retried by re-ingesting the same video id.
    #[error("ingestion failed: {0}")]
    Ingestion(String),

    /// Storage or index capacity exceeded. Fatal for this operation only;
    /// other videos' state is untouched.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Ingestion(format!("storage io: {e}"))
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Ingestion(format!("record encoding: {e}"))
    }
}
