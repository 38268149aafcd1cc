use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Job,
    Run,
    Report,
    Artifact,
    Document,
    Scripts,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Job => "job",
            EntityKind::Run => "run",
            EntityKind::Report => "report",
            EntityKind::Artifact => "artifact",
            EntityKind::Document => "document",
            EntityKind::Scripts => "scripts",
        };
        f.write_str(s)
    }
}

/// Error taxonomy of the pipeline core.
///
/// Validation, not-found and precondition failures carry enough structure
/// for a caller to render a specific message. Environment failures during
/// execution are not raised through here at all; they land in the run's
/// status and artifacts so a run record exists for operators to inspect.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid requirements document: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("input is not valid UTF-8")]
    Encoding,

    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("{needed} missing for {id}; run `{stage}` first")]
    Precondition {
        id: String,
        needed: &'static str,
        stage: &'static str,
    },

    #[error("stored input file is missing: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("invalid artifact name: {0}")]
    InvalidArtifactName(String),

    #[error("storage backend error: {0}")]
    Storage(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        PipelineError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

impl From<rusqlite::Error> for PipelineError {
    fn from(e: rusqlite::Error) -> Self {
        PipelineError::Storage(e.to_string())
    }
}
