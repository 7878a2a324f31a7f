//! # lumina-core
//!
//! Orchestration policy layer for Lumina:
//! - Safety: 2단계 어휘 필터 + 문장 단위 삭제
//! - Quota: UTC 일일 사용량 창
//! - Cache: 해시 키 캐시 + 디스커버리 믹스 전략

pub mod cache;
pub mod quota;
pub mod safety;

pub use cache::ContentCache;
pub use quota::QuotaTracker;
pub use safety::SafetyFilter;
