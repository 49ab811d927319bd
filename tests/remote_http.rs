//! Integration tests for remote documents served over HTTP.

#![cfg(feature = "remote")]

use feature_release::prelude::*;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn serve(server: &MockServer, status: u16, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/remote-config.json"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_init_remote_over_http() {
    let server = MockServer::start().await;
    serve(
        &server,
        200,
        json!({ "f": { "releaseByPercentage": 0, "individualTargets": { "x": true } } }),
    )
    .await;

    let url = format!("{}/remote-config.json", server.uri());
    let release = ReleaseGate::new()
        .init_remote(FeatureRelease::remote(&url))
        .await
        .unwrap();

    assert!(release.is_enabled("f", "x", None));
    assert!(!release.is_enabled("f", "y", None));
    assert_eq!(release.remote_url(), Some(url.as_str()));
}

#[tokio::test]
async fn test_init_remote_http_errors() {
    let server = MockServer::start().await;
    let url = format!("{}/remote-config.json", server.uri());
    let gate = ReleaseGate::new();

    serve(&server, 500, json!({})).await;
    let err = gate
        .init_remote(FeatureRelease::remote(&url).with_polling(true))
        .await
        .unwrap_err();
    assert!(matches!(err, ReleaseError::CannotDownloadConfig(_)));

    serve(&server, 200, json!({ "f": { "releaseByPercentage": 101 } })).await;
    let err = gate
        .init_remote(FeatureRelease::remote(&url))
        .await
        .unwrap_err();
    assert!(matches!(err, ReleaseError::IncorrectConfig(_)));

    serve(&server, 200, json!({ "f": { "releaseByPercentage": 100 } })).await;
    let release = gate.init_remote(FeatureRelease::remote(&url)).await.unwrap();
    assert!(release.is_enabled("f", "anyone", None));
}

#[tokio::test]
async fn test_polling_over_http() {
    let server = MockServer::start().await;
    let url = format!("{}/remote-config.json", server.uri());

    serve(&server, 200, json!({ "f": { "releaseByPercentage": 0 } })).await;
    serve(&server, 200, json!({ "f": { "releaseByPercentage": 100 } })).await;

    let release = FeatureRelease::remote(&url)
        .with_polling(true)
        .with_polling_interval_secs(1)
        .build()
        .await
        .unwrap();
    assert!(!release.is_enabled("f", "x", None));

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert!(release.is_enabled("f", "x", None));

    // The server has nothing left to serve; failed ticks keep the last document.
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(release.is_enabled("f", "x", None));

    assert!(release.stop_polling().await);
}
