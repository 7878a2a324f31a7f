//! Bearer-token resolution against the platform auth service

use async_trait::async_trait;
use lumina_foundation::{AuthProvider, Error, Result};
use serde::Deserialize;
use std::time::Duration;

const AUTH_TIMEOUT_SECS: u64 = 10;

/// Resolves bearer tokens by asking the auth service who they belong to
pub struct HttpAuthProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAuthProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(AUTH_TIMEOUT_SECS))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
}

#[async_trait]
impl AuthProvider for HttpAuthProvider {
    async fn resolve_identity(&self, credential: &str) -> Result<String> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .bearer_auth(credential)
            .send()
            .await
            .map_err(|e| Error::Http(format!("Auth service unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Unauthorized("Please log in.".to_string()));
        }

        let user: AuthUser = response
            .json()
            .await
            .map_err(|e| Error::Http(format!("Malformed auth response: {}", e)))?;

        Ok(user.id)
    }
}

/// Rejects every credential. Wired in when no auth service is configured,
/// which keeps quota-consuming actions closed rather than silently open.
pub struct NullAuthProvider;

#[async_trait]
impl AuthProvider for NullAuthProvider {
    async fn resolve_identity(&self, _credential: &str) -> Result<String> {
        Err(Error::Unauthorized(
            "Authentication is not configured.".to_string(),
        ))
    }
}
