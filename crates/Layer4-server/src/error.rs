//! Error -> HTTP response mapping
//!
//! Transient upstream conditions (rate limited, overloaded) get distinct
//! statuses and messages so the caller can decide whether to retry;
//! internal details never leak to the wire.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lumina_foundation::Error;
use serde_json::json;

/// Wrapper carrying a core error through an Axum handler
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Error::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Error::Overloaded(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::InvalidAction(_) | Error::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            Error::SafetyViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("internal error: {}", self.0);
            "Internal Server Error".to_string()
        } else {
            self.0.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError(Error::Unauthorized("x".into())).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError(Error::QuotaExceeded { usage: 5, limit: 5 }).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError(Error::RateLimited("x".into())).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError(Error::Overloaded("x".into())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError(Error::InvalidAction("x".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError(Error::SafetyViolation("x".into())).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError(Error::Internal("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
