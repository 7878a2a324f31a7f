//! Core Traits - 핵심 인터페이스 정의
//!
//! Layer2 이상에서 구현하거나 소비하는 외부 협력자 경계를 정의합니다.
//! 저장소와 인증 제공자는 이 trait 뒤에 숨겨져 테스트에서 쉽게 교체됩니다.

use crate::core::types::{CacheRecord, QuotaRecord};
use crate::Result;
use async_trait::async_trait;

// ============================================================================
// Backing Store - 관계형 저장소 경계
// ============================================================================

/// Keyed access to the two persistence tables the core depends on.
///
/// The contract is intentionally narrow: point read, point insert/update.
/// No transactions are assumed, so correctness under contention is
/// best-effort (see the quota tracker's read-modify-write note).
#[async_trait]
pub trait BackingStore: Send + Sync {
    /// Point read of a user's quota record
    async fn quota_get(&self, user_id: &str) -> Result<Option<QuotaRecord>>;

    /// Insert or overwrite a user's quota record
    async fn quota_put(&self, record: &QuotaRecord) -> Result<()>;

    /// Point read of a cache entry by hash
    async fn cache_get(&self, hash: &str) -> Result<Option<CacheRecord>>;

    /// Insert a cache entry, superseding any previous row with the same hash
    async fn cache_put(&self, record: &CacheRecord) -> Result<()>;
}

// ============================================================================
// Auth Provider - 인증 경계
// ============================================================================

/// Resolves a bearer credential to a stable user identity.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Returns the user id for a valid credential, or `Error::Unauthorized`.
    async fn resolve_identity(&self, credential: &str) -> Result<String>;
}
