//! Google Gemini provider implementation
//!
//! Structured JSON output via `responseSchema`, image generation via the
//! image model, and narration via the TTS preview model.

use crate::{
    error::ProviderError,
    r#trait::{GenerateRequest, GenerativeProvider},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
// The hosting platform enforces a 60s invocation deadline; the client
// timeout must stay inside it.
const DEFAULT_TIMEOUT_SECS: u64 = 55;

const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
const DEFAULT_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";
const DEFAULT_VOICE: &str = "Kore";

/// Google Gemini provider
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    text_model: String,
    image_model: String,
    tts_model: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
                .build()
                .expect("Failed to create HTTP client"),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            tts_model: DEFAULT_TTS_MODEL.to_string(),
        }
    }

    /// Set custom timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");
        self
    }

    /// Point at a custom endpoint (testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    pub fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        )
    }

    async fn post(&self, model: &str, request: &GeminiRequest) -> Result<GeminiResponse, ProviderError> {
        let response = self
            .client
            .post(self.generate_url(model))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::parse_error_response(status.as_u16(), &body));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    fn parse_error_response(status: u16, body: &str) -> ProviderError {
        // Prefer the structured status the API reports over the HTTP code
        if let Ok(error_response) = serde_json::from_str::<GeminiErrorResponse>(body) {
            let error = error_response.error;
            let message = error.message;

            return match error.status.as_deref() {
                Some("RESOURCE_EXHAUSTED") => ProviderError::RateLimited {
                    retry_after_ms: None,
                },
                Some("UNAVAILABLE") => ProviderError::Overloaded(message),
                Some("INVALID_ARGUMENT") => ProviderError::InvalidRequest(message),
                Some("PERMISSION_DENIED") | Some("UNAUTHENTICATED") => {
                    ProviderError::Authentication(message)
                }
                _ => ProviderError::from_http_status(status, &message),
            };
        }

        ProviderError::from_http_status(status, body)
    }

    fn single_text_request(prompt: &str, config: GeminiGenerationConfig) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: None,
                parts: vec![GeminiPart::Text {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: Some(config),
        }
    }

    /// Collect the concatenated text parts of the first candidate
    fn extract_text(response: GeminiResponse) -> Result<String, ProviderError> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("No candidates in response".to_string()))?;

        let mut text = String::new();
        if let Some(content) = candidate.content {
            for part in content.parts {
                if let GeminiPart::Text { text: t } = part {
                    text.push_str(&t);
                }
            }
        }

        if text.is_empty() {
            return Err(ProviderError::InvalidResponse(
                "No text parts in response".to_string(),
            ));
        }

        Ok(text)
    }

    /// Find the first inline-data part of the first candidate
    fn extract_inline_data(response: GeminiResponse) -> Option<GeminiInlineData> {
        let candidate = response.candidates.into_iter().next()?;
        candidate.content?.parts.into_iter().find_map(|part| match part {
            GeminiPart::InlineData { inline_data } => Some(inline_data),
            _ => None,
        })
    }
}

#[async_trait]
impl GenerativeProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<Value, ProviderError> {
        let gemini_request = Self::single_text_request(
            &request.prompt,
            GeminiGenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(request.response_schema.clone()),
                temperature: request.temperature,
                top_p: request.top_p,
                top_k: request.top_k,
                ..Default::default()
            },
        );

        let response = self.post(&self.text_model, &gemini_request).await?;
        let text = Self::extract_text(response)?;

        serde_json::from_str(&text)
            .map_err(|e| ProviderError::InvalidResponse(format!("Malformed JSON result: {}", e)))
    }

    async fn generate_image(&self, prompt: &str) -> Result<String, ProviderError> {
        let gemini_request = Self::single_text_request(
            prompt,
            GeminiGenerationConfig {
                response_modalities: Some(vec!["IMAGE".to_string()]),
                ..Default::default()
            },
        );

        let response = self.post(&self.image_model, &gemini_request).await?;

        Self::extract_inline_data(response)
            .map(|inline| format!("data:{};base64,{}", inline.mime_type, inline.data))
            .ok_or_else(|| ProviderError::InvalidResponse("No image data returned".to_string()))
    }

    async fn generate_audio(&self, text: &str) -> Result<String, ProviderError> {
        let gemini_request = Self::single_text_request(
            text,
            GeminiGenerationConfig {
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(serde_json::json!({
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": DEFAULT_VOICE }
                    }
                })),
                ..Default::default()
            },
        );

        let response = self.post(&self.tts_model, &gemini_request).await?;

        Self::extract_inline_data(response)
            .map(|inline| inline.data)
            .ok_or_else(|| ProviderError::InvalidResponse("No audio data returned".to_string()))
    }
}

// ============================================================================
// Gemini API Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
}

// Response types
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

// Error types
#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
    status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_url() {
        let provider = GeminiProvider::new("test-key");
        let url = provider.generate_url("gemini-2.5-flash");
        assert!(url.contains("generateContent"));
        assert!(url.contains("gemini-2.5-flash"));
        assert!(url.contains("key=test-key"));
    }

    #[test]
    fn test_request_serialization_is_camel_case() {
        let request = GeminiProvider::single_text_request(
            "hello",
            GeminiGenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(serde_json::json!({"type": "OBJECT"})),
                temperature: Some(0.4),
                ..Default::default()
            },
        );

        let json = serde_json::to_value(&request).unwrap();
        let config = json.get("generationConfig").unwrap();
        assert_eq!(config["responseMimeType"], "application/json");
        assert_eq!(config["temperature"], 0.4);
        // Unset knobs stay off the wire
        assert!(config.get("topP").is_none());
        assert!(config.get("responseModalities").is_none());
    }

    #[test]
    fn test_extract_text_concatenates_parts() {
        let response: GeminiResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "{\"a\":"}, {"text": "1}"}]
                }
            }]
        }))
        .unwrap();

        assert_eq!(GeminiProvider::extract_text(response).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_extract_inline_data() {
        let response: GeminiResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [{
                        "inlineData": {"mimeType": "image/jpeg", "data": "QUJD"}
                    }]
                }
            }]
        }))
        .unwrap();

        let inline = GeminiProvider::extract_inline_data(response).unwrap();
        assert_eq!(inline.mime_type, "image/jpeg");
        assert_eq!(inline.data, "QUJD");
    }

    #[test]
    fn test_parse_error_response_structured_status() {
        let body = r#"{"error": {"message": "try later", "status": "RESOURCE_EXHAUSTED"}}"#;
        assert!(matches!(
            GeminiProvider::parse_error_response(429, body),
            ProviderError::RateLimited { .. }
        ));

        let body = r#"{"error": {"message": "The model is overloaded", "status": "UNAVAILABLE"}}"#;
        assert!(matches!(
            GeminiProvider::parse_error_response(503, body),
            ProviderError::Overloaded(_)
        ));

        let body = r#"{"error": {"message": "bad schema", "status": "INVALID_ARGUMENT"}}"#;
        assert!(matches!(
            GeminiProvider::parse_error_response(400, body),
            ProviderError::InvalidRequest(_)
        ));
    }

    #[test]
    fn test_parse_error_response_plain_body() {
        assert!(matches!(
            GeminiProvider::parse_error_response(503, "Service Unavailable"),
            ProviderError::Overloaded(_)
        ));
    }
}
