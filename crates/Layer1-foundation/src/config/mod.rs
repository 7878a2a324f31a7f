//! App Configuration - 오케스트레이션 정책 설정
//!
//! 쿼터 한도, 캐시 버전, 디스커버리 믹스 확률 등 모든 정책 상수를
//! 하나의 불변 설정 값으로 관리합니다. 전역 상수가 아니라 생성 시점에
//! 오케스트레이터로 주입되므로 테스트에서 자유롭게 바꿀 수 있습니다.

use serde::{Deserialize, Serialize};

/// Bump this to logically invalidate all previously cached content.
/// Old rows are never deleted, only shadowed by the new key space.
pub const DEFAULT_CACHE_VERSION: &str = "v2";

/// Default per-user daily generation limit.
///
/// Effectively disables enforcement (billing protection only); the
/// rejection checkpoint itself is always active, so lowering this in
/// config is all a real limit needs.
pub const DEFAULT_DAILY_QUOTA_LIMIT: u64 = 999_999_999;

// ============================================================================
// Safety Mode
// ============================================================================

/// What to do when generated content trips the strict lexicon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyMode {
    /// Redact the violating sentences from free-text fields and serve
    /// the reduced content (default).
    Sanitize,
    /// Fail the whole request with a safety violation error.
    Reject,
}

impl Default for SafetyMode {
    fn default() -> Self {
        SafetyMode::Sanitize
    }
}

// ============================================================================
// Discovery (mixed-list) Settings
// ============================================================================

/// Tuning for the mixed-content strategy on discovery lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryConfig {
    /// Target list length for a discovery response
    pub list_len: usize,

    /// Probability of returning a cached list unchanged (full hit)
    pub reuse_probability: f64,

    /// Fresh items requested when one cached item is carried forward
    pub refresh_count: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            list_len: 5,
            reuse_probability: 0.3,
            refresh_count: 2,
        }
    }
}

// ============================================================================
// App Config (통합)
// ============================================================================

/// Lumina 오케스트레이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Per-user daily generation limit
    pub daily_quota_limit: u64,

    /// Cache-format version mixed into every cache key
    pub cache_version: String,

    /// Retry attempts for primary generation calls
    pub retry_max_attempts: u32,

    /// Safety filter behavior on violation
    #[serde(default)]
    pub safety_mode: SafetyMode,

    /// Mixed-list strategy tuning
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            daily_quota_limit: DEFAULT_DAILY_QUOTA_LIMIT,
            cache_version: DEFAULT_CACHE_VERSION.to_string(),
            retry_max_attempts: 3,
            safety_mode: SafetyMode::default(),
            discovery: DiscoveryConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 테스트/개발용: 낮은 쿼터 한도
    pub fn with_quota_limit(mut self, limit: u64) -> Self {
        self.daily_quota_limit = limit;
        self
    }

    pub fn with_cache_version(mut self, version: impl Into<String>) -> Self {
        self.cache_version = version.into();
        self
    }

    pub fn with_safety_mode(mut self, mode: SafetyMode) -> Self {
        self.safety_mode = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.cache_version, "v2");
        assert_eq!(config.retry_max_attempts, 3);
        assert_eq!(config.safety_mode, SafetyMode::Sanitize);
        assert_eq!(config.discovery.list_len, 5);
        assert!((config.discovery.reuse_probability - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_builder_overrides() {
        let config = AppConfig::new()
            .with_quota_limit(3)
            .with_cache_version("v3")
            .with_safety_mode(SafetyMode::Reject);

        assert_eq!(config.daily_quota_limit, 3);
        assert_eq!(config.cache_version, "v3");
        assert_eq!(config.safety_mode, SafetyMode::Reject);
    }
}
