//! HTTP surface: one RPC dispatch endpoint plus a liveness ping

use crate::error::ApiError;
use crate::throttle::RequestThrottle;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::routing::{get, post};
use axum::{Json, Router};
use lumina_orchestrator::{parse_action, RequestOrchestrator};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

/// Application-wide state shared across routes
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<RequestOrchestrator>,
    pub throttle: Arc<RequestThrottle>,
}

/// Build the router with tracing and permissive CORS
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/generate", post(generate))
        .route("/health/ping", get(ping))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// GET /health/ping - liveness check
async fn ping() -> &'static str {
    "pong"
}

/// POST /api/generate - the single `{action, payload}` dispatch endpoint
async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let credential = bearer_token(&headers);

    // Authenticated callers get their own throttle bucket; anonymous
    // traffic shares one.
    let client_key = credential.unwrap_or("anonymous");
    state
        .throttle
        .check(client_key)
        .map_err(|e| ApiError(e.into()))?;

    let action = parse_action(body)?;

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("request", %request_id, action = action.name());

    let result = state
        .orchestrator
        .handle(action, credential)
        .instrument(span)
        .await?;

    Ok(Json(result))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::NullAuthProvider;
    use crate::throttle::ThrottleWindow;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use lumina_foundation::{AppConfig, AuthProvider, BackingStore, Storage};
    use lumina_provider::{GeminiProvider, GenerativeProvider};
    use serde_json::json;
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_state(throttle: RequestThrottle) -> AppState {
        let store: Arc<dyn BackingStore> = Arc::new(Storage::in_memory().unwrap());
        // None of these tests reach the upstream, so an unconfigured
        // provider is fine.
        let provider: Arc<dyn GenerativeProvider> = Arc::new(GeminiProvider::new(""));
        let auth: Arc<dyn AuthProvider> = Arc::new(NullAuthProvider);

        AppState {
            orchestrator: Arc::new(RequestOrchestrator::new(
                AppConfig::default(),
                store,
                provider,
                auth,
            )),
            throttle: Arc::new(throttle),
        }
    }

    fn rpc_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/generate")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn response_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_ping() {
        let app = create_router(test_state(RequestThrottle::new()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health/ping")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_action_returns_400_with_error_body() {
        let app = create_router(test_state(RequestThrottle::new()));

        let response = app
            .oneshot(rpc_request(json!({"action": "mineBitcoin", "payload": {}})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("unknown variant"));
    }

    #[tokio::test]
    async fn test_anonymous_quota_read() {
        let app = create_router(test_state(RequestThrottle::new()));

        let response = app
            .oneshot(rpc_request(json!({"action": "getUserQuota", "payload": {}})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["usage"], 0);
    }

    #[tokio::test]
    async fn test_quota_action_without_credential_is_401() {
        let app = create_router(test_state(RequestThrottle::new()));

        let response = app
            .oneshot(rpc_request(json!({
                "action": "generateScienceEntry",
                "payload": { "item": {
                    "name": "Gravity",
                    "field": "physics",
                    "era": "Early Modern",
                    "description": "Why things fall.",
                    "tags": []
                }}
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_throttle_rejects_with_429() {
        let throttle = RequestThrottle::with_windows(vec![ThrottleWindow {
            window: Duration::from_secs(60),
            max_requests: 1,
            name: "burst",
        }]);
        let app = create_router(test_state(throttle));

        let first = app
            .clone()
            .oneshot(rpc_request(json!({"action": "getUserQuota", "payload": {}})))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .oneshot(rpc_request(json!({"action": "getUserQuota", "payload": {}})))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

        let body = response_json(second).await;
        assert!(body["error"].as_str().unwrap().contains("wait"));
    }
}
