//! HTTP API handlers.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::error;

use crate::manager::ConfigManager;
use crate::registry::{Provider, Registry};

/// Fixed status reported by the health endpoint.
pub const HEALTHY: &str = "healthy";
/// Message reported by the health endpoint.
pub const HEALTH_MESSAGE: &str = "Provider gateway is running";
/// Type tag given to every listed provider.
pub const PROVIDER_TYPE_CORE: &str = "core";

/// Application state shared with handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Provider registry.
    pub registry: Arc<Registry>,
    /// System configuration source.
    pub config_manager: Arc<ConfigManager>,
    /// When the listener came up, if it has.
    pub started_at: Arc<RwLock<Option<Instant>>>,
}

impl AppState {
    /// Create new app state.
    pub fn new(registry: Arc<Registry>, config_manager: Arc<ConfigManager>) -> Self {
        Self {
            registry,
            config_manager,
            started_at: Arc::new(RwLock::new(None)),
        }
    }

    /// Record that the listener is serving as of now.
    pub async fn mark_started(&self) {
        *self.started_at.write().await = Some(Instant::now());
    }

    /// Whole seconds since the listener started; zero if it never did.
    pub async fn uptime_seconds(&self) -> u64 {
        let started_at = *self.started_at.read().await;
        started_at
            .map(|started| started.elapsed().as_secs())
            .unwrap_or(0)
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "healthy".
    pub status: &'static str,
    /// Human-readable message.
    pub message: &'static str,
    /// Time the response was built.
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
}

/// A single provider in the providers listing.
#[derive(Debug, Serialize)]
pub struct ProviderInfo {
    /// Provider name.
    pub name: String,
    /// Provider type tag.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Description derived from the name.
    pub description: String,
}

impl ProviderInfo {
    fn from_name(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: PROVIDER_TYPE_CORE,
            description: format!("{} provider", name),
        }
    }
}

/// Providers listing response.
#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    /// Always "success".
    pub status: &'static str,
    /// Number of entries in `providers`.
    pub count: usize,
    /// Registered providers.
    pub providers: Vec<ProviderInfo>,
}

/// Status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Always "ok".
    pub status: &'static str,
    /// Current configuration version.
    pub version: String,
    /// Time the response was built.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Seconds since the listener started.
    pub uptime_seconds: u64,
    /// Selected configuration values.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<&'static str, String>,
}

/// Health check handler - always returns 200.
pub async fn health() -> Response {
    let response = HealthResponse {
        status: HEALTHY,
        message: HEALTH_MESSAGE,
        time: OffsetDateTime::now_utc(),
    };

    encode_json(StatusCode::OK, &response, "health")
}

/// Providers handler - lists every registered provider.
pub async fn list_providers(State(state): State<AppState>) -> Response {
    let providers: Vec<ProviderInfo> = state
        .registry
        .list()
        .iter()
        .map(|provider| ProviderInfo::from_name(provider.name()))
        .collect();

    let response = ProvidersResponse {
        status: "success",
        count: providers.len(),
        providers,
    };

    encode_json(StatusCode::OK, &response, "providers")
}

/// Status handler - reports the current configuration version.
pub async fn status(State(state): State<AppState>) -> Response {
    let config = state.config_manager.get();

    let mut config_map = BTreeMap::new();
    config_map.insert("version", config.version.clone());

    let response = StatusResponse {
        status: "ok",
        version: config.version.clone(),
        timestamp: OffsetDateTime::now_utc(),
        uptime_seconds: state.uptime_seconds().await,
        config: config_map,
    };

    encode_json(StatusCode::OK, &response, "status")
}

/// Rejects every method other than GET.
pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "GET")],
        "Method not allowed\n",
    )
}

/// Serialize `value` as the body of a response with `status`.
///
/// The status is decided before encoding. An encoding failure is logged and
/// leaves the body empty; it never turns the response into an error.
pub(crate) fn encode_json<T: Serialize>(
    status: StatusCode,
    value: &T,
    endpoint: &'static str,
) -> Response {
    let mut body = Vec::with_capacity(128);
    match serde_json::to_writer(&mut body, value) {
        Ok(()) => body.push(b'\n'),
        Err(e) => {
            error!(endpoint, error = %e, "Failed to encode response");
            body.clear();
        }
    }

    (
        status,
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        )],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::SystemConfig;
    use axum::body::to_bytes;
    use serde::ser::Error as _;

    fn state() -> AppState {
        AppState::new(
            Arc::new(Registry::new()),
            Arc::new(ConfigManager::new(SystemConfig::new("0.0.1"))),
        )
    }

    #[test]
    fn provider_info_is_derived_from_name() {
        let info = ProviderInfo::from_name("alpha");
        assert_eq!(info.name, "alpha");
        assert_eq!(info.kind, "core");
        assert_eq!(info.description, "alpha provider");
    }

    #[tokio::test]
    async fn uptime_is_zero_until_started() {
        let state = state();
        assert_eq!(state.uptime_seconds().await, 0);

        state.mark_started().await;
        assert!(state.started_at.read().await.is_some());
        assert_eq!(state.uptime_seconds().await, 0);
    }

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("boom"))
        }
    }

    #[tokio::test]
    async fn encode_failure_keeps_status_and_empties_body() {
        let response = encode_json(StatusCode::OK, &Unencodable, "test");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn encoded_body_ends_with_newline() {
        let response = encode_json(StatusCode::OK, &serde_json::json!({"a": 1}), "test");

        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"{\"a\":1}\n");
    }
}
