//! Failure injection tests for the relay.

use std::sync::atomic::Ordering;
use std::time::Duration;

use api_relay::config::RelayConfig;
use reqwest::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;

mod common;

#[tokio::test]
async fn test_unreachable_upstream_returns_500() {
    let dead = common::closed_addr();
    let (addr, shutdown) = common::start_relay(format!("http://{}/api", dead)).await;

    let res = common::client()
        .post(format!("http://{}/", addr))
        .body(r#"{"LoginType": 1}"#)
        .send()
        .await
        .expect("Relay unreachable");

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(res.headers()[CONTENT_TYPE], "application/json");

    let body: Value = res.json().await.unwrap();
    let message = body["error"].as_str().expect("error message");
    assert!(!message.is_empty());
    assert_eq!(body.as_object().unwrap().len(), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_connection_dropped_by_upstream_returns_500() {
    let (upstream, hits) = common::start_programmable_backend(|| async { None }).await;
    let (addr, shutdown) = common::start_relay(format!("http://{}/api", upstream)).await;

    let res = common::client()
        .post(format!("http://{}/", addr))
        .body(r#"{"UserName": "a"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].is_string());
    // No retry after a transport failure
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_slow_upstream_times_out_with_cors() {
    let (upstream, hits) = common::start_programmable_backend(|| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Some((200, r#"{"token":"late"}"#.to_string()))
    })
    .await;
    let mut config = RelayConfig::default();
    config.upstream.base_url = format!("http://{}/api", upstream);
    config.timeouts.request_secs = 1;
    let (addr, shutdown) = common::start_relay_with(config).await;

    let res = common::client()
        .post(format!("http://{}/", addr))
        .body(r#"{"LoginType": 1}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(res.headers()[CONTENT_TYPE], "application/json");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "upstream did not respond within 1s");
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_503_is_relayed_without_retry() {
    let (upstream, hits) = common::start_programmable_backend(|| async {
        Some((503, "upstream is down".to_string()))
    })
    .await;
    let (addr, shutdown) = common::start_relay(format!("http://{}/api", upstream)).await;

    let res = common::client()
        .post(format!("http://{}/", addr))
        .body("{}")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    // Upstream content type is replaced, body is not
    assert_eq!(res.headers()[CONTENT_TYPE], "application/json");
    assert_eq!(res.text().await.unwrap(), "upstream is down");
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_server_stops_on_shutdown() {
    let (upstream, _) = common::start_programmable_backend(|| async {
        Some((200, "{}".to_string()))
    })
    .await;
    let (addr, shutdown) = common::start_relay(format!("http://{}/api", upstream)).await;
    let client = common::client();

    let res = client.post(format!("http://{}/", addr)).body("{}").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let fresh = reqwest::Client::builder().no_proxy().build().unwrap();
    assert!(fresh.post(format!("http://{}/", addr)).body("{}").send().await.is_err());
}
