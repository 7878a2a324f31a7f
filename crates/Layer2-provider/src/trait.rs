//! Generative provider trait and request types

use crate::error::ProviderError;
use async_trait::async_trait;
use serde_json::Value;

/// A structured-output generation request
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Full prompt text
    pub prompt: String,

    /// JSON schema the upstream must shape its result to
    pub response_schema: Value,

    /// Sampling temperature (lower stabilizes spelling and structure)
    pub temperature: Option<f32>,

    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>, response_schema: Value) -> Self {
        Self {
            prompt: prompt.into(),
            response_schema,
            temperature: Some(0.4),
            top_p: None,
            top_k: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }
}

/// Interface to the external generative-content service
///
/// All methods may fail transiently (rate limited, overloaded) or fatally;
/// callers wrap them in `with_retry` with an appropriate budget.
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Provider identifier for logging
    fn name(&self) -> &str;

    /// Generate a structured JSON result for the given prompt and schema
    async fn generate(&self, request: &GenerateRequest) -> Result<Value, ProviderError>;

    /// Generate an image for the prompt; returns a data URL
    async fn generate_image(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Narrate the text; returns base64-encoded audio
    async fn generate_audio(&self, text: &str) -> Result<String, ProviderError>;
}
