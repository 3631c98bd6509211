use serde::Serialize;
use std::fmt;

/// A single field-level validation problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("validation failed: {}", join_issues(.0))]
    Validation(Vec<FieldIssue>),
    #[error("patient not found: {0}")]
    NotFound(String),
    #[error("patient with this id already exists: {0}")]
    Conflict(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(
        "patient data unavailable (path: {path}): {source}",
        path = path.display()
    )]
    StorageUnavailable {
        path: std::path::PathBuf,
        #[source]
        source: StorageFault,
    },
}

/// Underlying cause of a storage failure.
#[derive(Debug, thiserror::Error)]
pub enum StorageFault {
    #[error("failed to read patient file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write patient file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to deserialize patient data: {0}")]
    Deserialization(serde_json::Error),
    #[error("failed to serialize patient data: {0}")]
    Serialization(serde_json::Error),
}

impl PatientError {
    pub(crate) fn storage(path: &std::path::Path, source: StorageFault) -> Self {
        PatientError::StorageUnavailable {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Field-level issues carried by a validation failure, empty otherwise.
    pub fn issues(&self) -> &[FieldIssue] {
        match self {
            PatientError::Validation(issues) => issues,
            _ => &[],
        }
    }
}

pub type PatientResult<T> = std::result::Result<T, PatientError>;
