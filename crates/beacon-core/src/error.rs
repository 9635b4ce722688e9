use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Common application error variants shared by ordinary request handlers.
///
/// Rendered as `{"error": <kind>, "message": <text>}`, the same field convention
/// the health report uses for failed backends.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidProps(String),
    #[error("{0}")]
    Service(String),
    #[error("{0}")]
    Business(String),
    #[error("{0}")]
    NoDataFound(String),
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidProps(_) => "InvalidPropsException",
            Self::Service(_) => "ServiceException",
            Self::Business(_) => "BusinessException",
            Self::NoDataFound(_) => "RepositoryNoDataFoundException",
            Self::Internal(_) => "InternalServerError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidProps(_) | Self::Service(_) | Self::Business(_) => StatusCode::BAD_REQUEST,
            Self::NoDataFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        // 4xx are expected client errors; TraceLayer already records them.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
