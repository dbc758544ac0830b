//! Sole translator from `PoolError` to an HTTP response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pagepool_types::PoolError;
use serde_json::json;

pub struct ApiError(pub PoolError);

impl From<PoolError> for ApiError {
    fn from(err: PoolError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            PoolError::PoolInactive => StatusCode::FORBIDDEN,
            PoolError::PoolAlreadyExists { .. } => StatusCode::CONFLICT,
            PoolError::PoolNotFound { .. } => StatusCode::NOT_FOUND,
            // Not in the §6 status table; falls under its "otherwise" rule.
            PoolError::PoolCapacityReached { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            PoolError::NoAvailableBrowser => StatusCode::SERVICE_UNAVAILABLE,
            PoolError::LaunchFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            PoolError::ActionFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            PoolError::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
            PoolError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            PoolError::InvalidSessionId { .. } => StatusCode::BAD_REQUEST,
            PoolError::PageSessionNotFound { .. } => StatusCode::NOT_FOUND,
            PoolError::BadParams { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_type = self.0.error_type();
        let message = self.0.to_string();

        match status {
            StatusCode::INTERNAL_SERVER_ERROR | StatusCode::SERVICE_UNAVAILABLE => {
                tracing::error!(error_type, message = %message, "request failed");
            }
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => {
                tracing::warn!(error_type, message = %message, "request rejected");
            }
            _ => {
                tracing::info!(error_type, message = %message, "request failed");
            }
        }

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message,
                "status": status.as_u16(),
            }
        }));
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
