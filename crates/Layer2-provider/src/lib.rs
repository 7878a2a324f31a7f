//! # lumina-provider
//!
//! Generative upstream abstraction layer for Lumina.
//!
//! ## Features
//! - Structured JSON generation against a result schema
//! - Image and narration generation
//! - Classification-driven retry with exponential backoff

pub mod error;
pub mod providers;
pub mod retry;
pub mod r#trait;

// Core trait and request types
pub use r#trait::{GenerateRequest, GenerativeProvider};

// Error and retry
pub use error::ProviderError;
pub use retry::{with_retry, ClassifiedError, FailureClass, RetryConfig};

// Provider implementations
pub use providers::gemini::GeminiProvider;
