//! Provider-specific error types
//!
//! ProviderError는 업스트림 생성 API의 세부 에러를 관리합니다.
//! lumina_foundation::Error와의 변환을 지원합니다.

use crate::retry::{ClassifiedError, FailureClass};
use lumina_foundation::Error as FoundationError;
use thiserror::Error;

/// Errors that can occur during upstream provider operations
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// Rate limit exceeded (HTTP 429 / RESOURCE_EXHAUSTED)
    #[error("Rate limit exceeded{}", .retry_after_ms.map(|ms| format!(", retry after {}ms", ms)).unwrap_or_default())]
    RateLimited { retry_after_ms: Option<u64> },

    /// Service unavailable / overloaded (HTTP 503 / UNAVAILABLE)
    #[error("Service overloaded: {0}")]
    Overloaded(String),

    /// API key is missing or invalid
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Invalid request (bad parameters)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid response from the API
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Network error (connection failed, DNS, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Unknown error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl ClassifiedError for ProviderError {
    fn classify(&self) -> FailureClass {
        match self {
            ProviderError::RateLimited { .. } => FailureClass::RateLimited,
            ProviderError::Overloaded(_) => FailureClass::Overloaded,

            // Everything else propagates without retry
            ProviderError::Authentication(_)
            | ProviderError::InvalidRequest(_)
            | ProviderError::InvalidResponse(_)
            | ProviderError::Network(_)
            | ProviderError::Unknown(_) => FailureClass::Fatal,
        }
    }
}

impl ProviderError {
    /// Create from HTTP status code and body
    pub fn from_http_status(status: u16, body: &str) -> Self {
        match status {
            429 => ProviderError::RateLimited {
                retry_after_ms: extract_retry_after(body),
            },
            503 => ProviderError::Overloaded(body.to_string()),
            401 | 403 => ProviderError::Authentication(body.to_string()),
            400 => ProviderError::InvalidRequest(body.to_string()),
            _ => {
                // Some gateways report overload or throttling only in the
                // message body; honor the pattern before giving up.
                let lower = body.to_lowercase();
                if lower.contains("overloaded") {
                    ProviderError::Overloaded(body.to_string())
                } else if lower.contains("rate limit") {
                    ProviderError::RateLimited {
                        retry_after_ms: extract_retry_after(body),
                    }
                } else {
                    ProviderError::Unknown(format!("HTTP {}: {}", status, body))
                }
            }
        }
    }
}

/// Try to extract retry-after value from error body (in milliseconds)
fn extract_retry_after(body: &str) -> Option<u64> {
    let json = serde_json::from_str::<serde_json::Value>(body).ok()?;
    let secs = json
        .get("error")
        .and_then(|e| e.get("retry_after"))
        .and_then(|v| v.as_f64())?;
    Some((secs * 1000.0) as u64)
}

// ============================================================================
// lumina_foundation::Error 변환
// ============================================================================

impl From<ProviderError> for FoundationError {
    fn from(err: ProviderError) -> Self {
        match &err {
            ProviderError::RateLimited { .. } => FoundationError::RateLimited(err.to_string()),
            ProviderError::Overloaded(_) => FoundationError::Overloaded(err.to_string()),
            ProviderError::Authentication(_)
            | ProviderError::InvalidRequest(_)
            | ProviderError::InvalidResponse(_)
            | ProviderError::Network(_)
            | ProviderError::Unknown(_) => FoundationError::Upstream(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let err = ProviderError::RateLimited {
            retry_after_ms: None,
        };
        assert_eq!(err.classify(), FailureClass::RateLimited);

        let err = ProviderError::Overloaded("busy".to_string());
        assert_eq!(err.classify(), FailureClass::Overloaded);

        assert_eq!(
            ProviderError::Network("refused".to_string()).classify(),
            FailureClass::Fatal
        );
        assert_eq!(
            ProviderError::InvalidResponse("bad json".to_string()).classify(),
            FailureClass::Fatal
        );
    }

    #[test]
    fn test_from_http_status() {
        assert!(matches!(
            ProviderError::from_http_status(429, "{}"),
            ProviderError::RateLimited { .. }
        ));
        assert!(matches!(
            ProviderError::from_http_status(503, "unavailable"),
            ProviderError::Overloaded(_)
        ));
        assert!(matches!(
            ProviderError::from_http_status(401, "bad key"),
            ProviderError::Authentication(_)
        ));
        // Message-pattern overload on a generic 500
        assert!(matches!(
            ProviderError::from_http_status(500, "The model is overloaded, try later"),
            ProviderError::Overloaded(_)
        ));
        assert!(matches!(
            ProviderError::from_http_status(500, "boom"),
            ProviderError::Unknown(_)
        ));
    }

    #[test]
    fn test_extract_retry_after() {
        let body = r#"{"error": {"retry_after": 1.5}}"#;
        assert_eq!(extract_retry_after(body), Some(1500));
        assert_eq!(extract_retry_after("not json"), None);
    }

    #[test]
    fn test_foundation_conversion_keeps_transient_kinds() {
        let err: FoundationError = ProviderError::Overloaded("busy".to_string()).into();
        assert!(err.is_transient());

        let err: FoundationError = ProviderError::Unknown("boom".to_string()).into();
        assert!(!err.is_transient());
    }
}
