//! Error types for Lumina
//!
//! 모든 에러를 중앙에서 관리

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Lumina 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 인증/쿼터 관련
    // ========================================================================
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Daily quota exceeded ({usage}/{limit})")]
    QuotaExceeded { usage: u64, limit: u64 },

    // ========================================================================
    // 업스트림 관련
    // ========================================================================
    #[error("Upstream rate limited: {0}")]
    RateLimited(String),

    #[error("Upstream overloaded: {0}")]
    Overloaded(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    // ========================================================================
    // 요청/콘텐츠 관련
    // ========================================================================
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Content blocked by safety filters: {0}")]
    SafetyViolation(String),

    // ========================================================================
    // 저장소 관련
    // ========================================================================
    #[error("Storage error: {0}")]
    Storage(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// 일시적인(재시도 가능성이 있는) 업스트림 상태인지 확인
    ///
    /// The UI distinguishes these from generic failures so the caller
    /// can decide whether a retry is worthwhile.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::RateLimited(_) | Error::Overloaded(_))
    }

    /// 사용자에게 그대로 보여줄 수 있는 에러인지 확인
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::Unauthorized(_)
                | Error::QuotaExceeded { .. }
                | Error::InvalidAction(_)
                | Error::InvalidPayload(_)
                | Error::SafetyViolation(_)
                | Error::RateLimited(_)
                | Error::Overloaded(_)
        )
    }

    /// Storage 에러 생성 헬퍼
    pub fn storage(message: impl Into<String>) -> Self {
        Error::Storage(message.into())
    }
}

// ============================================================================
// From 구현 (추가 변환)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}
