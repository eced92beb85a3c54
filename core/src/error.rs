use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Source '{source_name}' unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("Source '{source_name}' rejected query: {reason}")]
    SourceQueryError { source_name: String, reason: String },

    #[error("Malformed record from '{source_name}': {reason}")]
    MalformedRecord { source_name: String, reason: String },

    #[error("Cannot write report to '{destination}': {reason}")]
    SinkWriteError { destination: String, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipelineError {
    /// Source failures degrade to an empty dataset instead of aborting the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PipelineError::SourceUnavailable { .. } | PipelineError::SourceQueryError { .. }
        )
    }

    pub fn unavailable(source_name: &str, reason: impl ToString) -> Self {
        PipelineError::SourceUnavailable {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn query(source_name: &str, reason: impl ToString) -> Self {
        PipelineError::SourceQueryError {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(source_name: &str, reason: impl ToString) -> Self {
        PipelineError::MalformedRecord {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn sink(destination: &str, reason: impl ToString) -> Self {
        PipelineError::SinkWriteError {
            destination: destination.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
