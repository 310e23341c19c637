use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use civic_domain::complaint::ComplaintStatus;

/// Complaints service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum ComplaintsServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("forbidden")]
    Forbidden,
    #[error("complaint not found")]
    ComplaintNotFound,
    #[error("user not found")]
    UserNotFound,
    #[error("worker not found")]
    WorkerNotFound,
    #[error("email already registered")]
    EmailAlreadyRegistered,
    #[error("cannot change status from {from} to {to}")]
    InvalidTransition {
        from: ComplaintStatus,
        to: ComplaintStatus,
    },
    #[error("dependency failure: {0}")]
    DependencyFailure(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ComplaintsServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::Forbidden => "FORBIDDEN",
            Self::ComplaintNotFound => "COMPLAINT_NOT_FOUND",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::WorkerNotFound => "WORKER_NOT_FOUND",
            Self::EmailAlreadyRegistered => "EMAIL_ALREADY_REGISTERED",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::DependencyFailure(_) => "DEPENDENCY_FAILURE",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

// Extractor rejections answer in the same `{kind, message}` shape as every other 4xx.

impl From<JsonRejection> for ComplaintsServiceError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ComplaintsServiceError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for ComplaintsServiceError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for ComplaintsServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::ComplaintNotFound | Self::UserNotFound | Self::WorkerNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::EmailAlreadyRegistered | Self::InvalidTransition { .. } => StatusCode::CONFLICT,
            Self::DependencyFailure(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if let Self::Internal(ref e) = self {
            tracing::error!(error = ?e, kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
