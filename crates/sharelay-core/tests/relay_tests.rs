//! Integration tests for the relay engine against a mock endpoint.

mod common;

use std::time::Duration;

use common::{hook_url, mock_relay, received_bodies, Harness};
use sharelay_core::history::{LogStatus, LogStore};
use sharelay_core::relay::RelayEngine;
use sharelay_core::share::{ShareData, SharedFile};
use wiremock::matchers::{header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_relay_success_records_response() {
    let server = mock_relay(200, r#"{"success":true}"#).await;
    let harness = Harness::new();
    let log = harness.log_store();
    let engine = RelayEngine::new(log.clone());

    let share = ShareData::new().with_text("https://x.com/abc");
    let result = engine.relay(&share, &hook_url(&server)).await;

    assert!(result.success);
    assert_eq!(result.response.as_deref(), Some(r#"{"success":true}"#));
    assert!(result.error.is_none());

    let entries = log.list();
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries[0].status,
        LogStatus::Success {
            response: r#"{"success":true}"#.to_string()
        }
    );
    assert_eq!(entries[0].payload.text, "https://x.com/abc");
}

#[tokio::test]
async fn test_relay_body_sends_null_for_empty_fields() {
    let server = mock_relay(200, "ok").await;
    let harness = Harness::new();
    let engine = RelayEngine::new(harness.log_store());

    let share = ShareData::new().with_text("https://x.com/abc");
    engine.relay(&share, &hook_url(&server)).await;

    let bodies = received_bodies(&server).await;
    assert_eq!(bodies.len(), 1);
    assert!(bodies[0]["title"].is_null());
    assert_eq!(bodies[0]["text"], "https://x.com/abc");
    assert!(bodies[0]["url"].is_null());
    assert_eq!(bodies[0]["files"], serde_json::json!([]));
}

#[tokio::test]
async fn test_relay_sends_json_with_files_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new();
    let engine = RelayEngine::new(harness.log_store());

    let file = SharedFile::from_bytes("a.bin", "application/octet-stream", b"\x00\x01\x02");
    let share = ShareData::new().with_files(vec![file.clone()]);
    let result = engine.relay(&share, &server.uri()).await;

    assert!(result.success, "any 2xx is success");

    let bodies = received_bodies(&server).await;
    assert_eq!(bodies[0]["files"][0]["name"], "a.bin");
    assert_eq!(bodies[0]["files"][0]["type"], "application/octet-stream");
    assert_eq!(bodies[0]["files"][0]["data"], file.data.as_str());
}

#[tokio::test]
async fn test_relay_http_error_records_status_and_body() {
    let server = mock_relay(500, "oops").await;
    let harness = Harness::new();
    let log = harness.log_store();
    let engine = RelayEngine::new(log.clone());

    let result = engine
        .relay(&ShareData::new().with_title("t"), &hook_url(&server))
        .await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("HTTP 500: oops"));
    assert!(result.response.is_none());

    let entries = log.list();
    assert_eq!(
        entries[0].status,
        LogStatus::Error {
            error: "HTTP 500: oops".to_string()
        }
    );
}

#[tokio::test]
async fn test_relay_timeout_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let harness = Harness::new();
    let log = harness.log_store();
    let engine = RelayEngine::with_timeout(log.clone(), Some(Duration::from_millis(200))).unwrap();

    let result = engine.relay(&ShareData::new(), &server.uri()).await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("timed out"));
    assert!(!log.list()[0].is_pending());
}

#[tokio::test]
async fn test_each_relay_logs_one_entry_newest_first() {
    let server = mock_relay(200, "ok").await;
    let harness = Harness::new();
    let log = harness.log_store();
    let engine = RelayEngine::new(log.clone());

    for title in ["first", "second", "third"] {
        engine
            .relay(&ShareData::new().with_title(title), &hook_url(&server))
            .await;
    }

    let titles: Vec<_> = log.list().into_iter().map(|e| e.payload.title).collect();
    assert_eq!(titles, ["third", "second", "first"]);
}
