//! Integration tests for the capture -> handoff -> session -> relay flow.

mod common;

use common::{hook_url, mock_relay, received_bodies, Harness};
use reqwest::Url;
use sharelay_core::handoff::HandoffStore;
use sharelay_core::history::{LogStatus, LogStore};
use sharelay_core::intercept::{activation_url, ShareCapture, FIELD_TEXT, FIELD_TITLE};
use sharelay_core::Error;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn capture_text(harness: &Harness, text: &str) {
    let mut capture = ShareCapture::new();
    capture.text_field(FIELD_TEXT, text.to_string());
    assert!(harness.interceptor().store(capture).stored);
}

fn activation() -> Url {
    Url::parse(&activation_url("http://localhost:8787")).unwrap()
}

#[tokio::test]
async fn test_auto_relay_on_activation() {
    let server = mock_relay(200, r#"{"success":true}"#).await;
    let harness = Harness::new();
    harness.set_relay(&hook_url(&server), true);
    capture_text(&harness, "https://x.com/abc");

    let activation = harness.controller().activate(&activation()).await;

    let result = activation.auto_relayed.as_ref().expect("share relayed without asking");
    assert!(result.success);
    assert!(!activation.awaiting_decision());
    assert_eq!(activation.location.as_str(), "http://localhost:8787/");
    assert!(harness.handoff_store().get().is_none(), "slot cleared");

    assert_eq!(activation.logs.len(), 1);
    assert!(matches!(activation.logs[0].status, LogStatus::Success { .. }));
}

#[tokio::test]
async fn test_auto_relay_failure_still_clears_slot() {
    let server = mock_relay(503, "down").await;
    let harness = Harness::new();
    harness.set_relay(&hook_url(&server), true);
    capture_text(&harness, "hello");

    let activation = harness.controller().activate(&activation()).await;

    let result = activation.auto_relayed.unwrap();
    assert_eq!(result.error.as_deref(), Some("HTTP 503: down"));
    assert!(harness.handoff_store().get().is_none());
}

#[tokio::test]
async fn test_manual_mode_waits_for_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let harness = Harness::new();
    harness.set_relay(&server.uri(), false);
    capture_text(&harness, "hold on");

    let activation = harness.controller().activate(&activation()).await;

    assert!(activation.awaiting_decision());
    assert_eq!(activation.pending.unwrap().text, "hold on");
    assert!(harness.handoff_store().get().is_some());
    assert!(activation.logs.is_empty());
}

#[tokio::test]
async fn test_auto_relay_without_url_waits_for_user() {
    let harness = Harness::new();
    harness.set_relay("", true);
    capture_text(&harness, "no destination");

    let activation = harness.controller().activate(&activation()).await;

    assert!(activation.awaiting_decision());
}

#[tokio::test]
async fn test_activation_without_marker_ignores_slot() {
    let harness = Harness::new();
    capture_text(&harness, "waiting");

    let url = Url::parse("http://localhost:8787/?tab=logs").unwrap();
    let activation = harness.controller().activate(&url).await;

    assert!(!activation.marker_found);
    assert!(activation.pending.is_none());
    assert_eq!(activation.location, url);
}

#[tokio::test]
async fn test_repeated_activation_is_idempotent() {
    let server = mock_relay(200, "ok").await;
    let harness = Harness::new();
    harness.set_relay(&hook_url(&server), true);
    capture_text(&harness, "once");

    let controller = harness.controller();
    let first = controller.activate(&activation()).await;
    let second = controller.activate(&activation()).await;

    assert!(first.auto_relayed.is_some());
    assert!(second.marker_found);
    assert!(second.pending.is_none());
    assert!(second.auto_relayed.is_none());
    assert_eq!(received_bodies(&server).await.len(), 1);
    assert_eq!(second.logs.len(), 1);
}

#[tokio::test]
async fn test_relay_pending_uses_latest_capture() {
    let server = mock_relay(200, "ok").await;
    let harness = Harness::new();
    harness.set_relay(&hook_url(&server), false);
    capture_text(&harness, "first");

    let controller = harness.controller();
    let activation = controller.activate(&activation()).await;
    assert_eq!(activation.pending.unwrap().text, "first");

    capture_text(&harness, "second");
    let result = controller.relay_pending().await.unwrap();

    assert!(result.success);
    let bodies = received_bodies(&server).await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["text"], "second");
    assert!(controller.pending().is_none());
}

#[tokio::test]
async fn test_relay_pending_without_url_leaves_slot() {
    let harness = Harness::new();
    capture_text(&harness, "keep me");

    let err = harness.controller().relay_pending().await.unwrap_err();

    assert!(matches!(err, Error::RelayUrlMissing));
    assert!(harness.handoff_store().get().is_some());
    assert!(harness.log_store().list().is_empty());
}

#[tokio::test]
async fn test_relay_pending_with_empty_slot() {
    let harness = Harness::new();
    harness.set_relay("https://example.invalid/hook", false);

    let err = harness.controller().relay_pending().await.unwrap_err();
    assert!(matches!(err, Error::NoPendingShare));
}

#[tokio::test]
async fn test_discard_writes_no_log_entry() {
    let harness = Harness::new();
    capture_text(&harness, "never mind");

    let controller = harness.controller();
    assert!(controller.discard_pending().unwrap());
    assert!(!controller.discard_pending().unwrap());

    assert!(controller.pending().is_none());
    assert!(controller.logs().is_empty());
}

#[tokio::test]
async fn test_two_captures_keep_only_second() {
    let harness = Harness::new();

    let mut first = ShareCapture::new();
    first.text_field(FIELD_TITLE, "first".to_string());
    harness.interceptor().store(first);

    let mut second = ShareCapture::new();
    second.text_field(FIELD_TITLE, "second".to_string());
    harness.interceptor().store(second);

    assert_eq!(harness.handoff_store().get().unwrap().title, "second");
}

#[tokio::test]
async fn test_clear_logs() {
    let server = mock_relay(200, "ok").await;
    let harness = Harness::new();
    harness.set_relay(&hook_url(&server), false);
    capture_text(&harness, "logged");

    let controller = harness.controller();
    controller.relay_pending().await.unwrap();
    assert_eq!(controller.logs().len(), 1);

    controller.clear_logs().unwrap();
    assert!(controller.logs().is_empty());
    assert!(harness.log_store().list().is_empty());
}
