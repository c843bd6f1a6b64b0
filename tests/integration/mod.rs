//! Integration tests for the provider gateway.
//!
//! These tests bind a real listener on an ephemeral loopback port and talk to
//! it over HTTP.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use provider_gateway::api::Server;
use provider_gateway::manager::{ConfigManager, SystemConfig};
use provider_gateway::registry::{Registry, StaticProvider};
use serde_json::{json, Value};

/// Start a gateway with the given providers and version.
async fn start_gateway(
    providers: &[&str],
    version: &str,
) -> (Server, SocketAddr, Arc<ConfigManager>) {
    let registry = Arc::new(Registry::new());
    for name in providers {
        registry
            .register(Arc::new(StaticProvider::new(*name)))
            .unwrap();
    }
    let manager = Arc::new(ConfigManager::new(SystemConfig::new(version)));

    let server = Server::new(
        registry,
        Arc::clone(&manager),
        0,
        Duration::from_secs(5),
    )
    .with_host(IpAddr::from([127, 0, 0, 1]));

    let addr = server.start().await.unwrap();
    (server, addr, manager)
}

fn url(addr: SocketAddr, path: &str) -> String {
    format!("http://{}{}", addr, path)
}

#[tokio::test]
async fn test_health_over_http() {
    let (server, addr, _) = start_gateway(&[], "1.0.0").await;

    let response = reqwest::get(url(addr, "/health")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "application/json"
    );

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_providers_over_http() {
    let (server, addr, _) = start_gateway(&["alpha", "beta"], "1.0.0").await;

    let body: Value = reqwest::get(url(addr, "/api/v1/providers"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(
        body,
        json!({
            "status": "success",
            "count": 2,
            "providers": [
                {"name": "alpha", "type": "core", "description": "alpha provider"},
                {"name": "beta", "type": "core", "description": "beta provider"}
            ]
        })
    );

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_status_tracks_config_manager() {
    let (server, addr, manager) = start_gateway(&[], "1.2.3").await;

    let body: Value = reqwest::get(url(addr, "/api/v1/status"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["version"], "1.2.3");
    assert_eq!(body["config"]["version"], "1.2.3");
    assert!(body["uptime_seconds"].as_u64().is_some());

    manager.update(SystemConfig::new("1.2.4"));

    let body: Value = reqwest::get(url(addr, "/api/v1/status"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["version"], "1.2.4");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_post_is_rejected_over_http() {
    let (server, addr, _) = start_gateway(&["alpha"], "1.0.0").await;
    let client = reqwest::Client::new();

    for path in ["/health", "/api/v1/providers", "/api/v1/status"] {
        let response = client.post(url(addr, path)).send().await.unwrap();
        assert_eq!(
            response.status(),
            reqwest::StatusCode::METHOD_NOT_ALLOWED,
            "POST {}",
            path
        );
    }
    drop(client);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_stopped_server_refuses_connections() {
    let (server, addr, _) = start_gateway(&[], "1.0.0").await;
    server.stop().await.unwrap();

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    assert!(client.get(url(addr, "/health")).send().await.is_err());
}

async fn get_with_padding(addr: SocketAddr, padding: usize) -> reqwest::StatusCode {
    reqwest::Client::new()
        .get(url(addr, "/health"))
        .header("x-padding", "a".repeat(padding))
        .send()
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_large_headers_under_one_mib_are_accepted() {
    let (server, addr, _) = start_gateway(&[], "1.0.0").await;

    assert_eq!(get_with_padding(addr, 600_000).await, reqwest::StatusCode::OK);
    assert_eq!(get_with_padding(addr, 900_000).await, reqwest::StatusCode::OK);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_headers_over_one_mib_are_rejected() {
    let (server, addr, _) = start_gateway(&[], "1.0.0").await;

    assert_eq!(
        get_with_padding(addr, (1 << 20) + 1).await,
        reqwest::StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE
    );

    server.stop().await.unwrap();
}
