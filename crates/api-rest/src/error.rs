use api_shared::ErrorRes;
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use pms_core::{FieldIssue, PatientError};

/// Error carried out of a handler or extractor and rendered as a JSON [`ErrorRes`].
#[derive(Debug)]
pub enum ApiError {
    Patient(PatientError),
    /// The request could not be decoded, so it never reached the core.
    Rejected {
        status: StatusCode,
        issue: FieldIssue,
    },
}

impl From<PatientError> for ApiError {
    fn from(err: PatientError) -> Self {
        Self::Patient(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            issue: FieldIssue::new("body", rejection.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            issue: FieldIssue::new("query", rejection.body_text()),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Patient(PatientError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Patient(PatientError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Patient(PatientError::Conflict(_) | PatientError::InvalidArgument(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Patient(PatientError::StorageUnavailable { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Rejected { status, .. } => *status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            ApiError::Patient(err @ PatientError::StorageUnavailable { .. }) => {
                tracing::error!("Patient storage error: {:?}", err);
                ErrorRes::new("Patient data is unavailable")
            }
            ApiError::Patient(PatientError::Validation(issues)) => {
                tracing::warn!("Rejected invalid patient: {} issue(s)", issues.len());
                ErrorRes::new("Validation failed").with_errors(issues)
            }
            ApiError::Patient(other) => {
                tracing::warn!("Request failed: {}", other);
                ErrorRes::new(other.to_string())
            }
            ApiError::Rejected { issue, .. } => {
                tracing::warn!("Rejected malformed request: {}", issue);
                ErrorRes::new("Malformed request").with_errors(vec![issue])
            }
        };

        (status, Json(body)).into_response()
    }
}
