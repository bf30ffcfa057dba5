//! HTTP endpoint handlers for the Sharelay web interface.
//!
//! This module contains the capture endpoint and the JSON session API.

#![allow(clippy::missing_errors_doc)]

use axum::{
    extract::{OriginalUri, State},
    http::StatusCode,
    response::Redirect,
    Json,
};
use axum_extra::extract::Multipart;
use reqwest::Url;
use serde::Serialize;

use crate::config::RelaySettings;
use crate::history::LogEntry;
use crate::intercept::{self, ShareCapture, FIELD_FILES};
use crate::relay::RelayResult;
use crate::share::ShareData;

use super::error::{ApiError, ApiResult};
use super::state::SharedState;

// ============================================================================
// Response types
// ============================================================================

/// A pending share as shown to the user, without file bytes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingShareView {
    title: String,
    text: String,
    url: String,
    files: Vec<FileView>,
    timestamp: i64,
}

/// Attachment metadata for display.
#[derive(Debug, Serialize)]
pub struct FileView {
    name: String,
    #[serde(rename = "type")]
    mime_type: String,
    size: usize,
}

impl From<&ShareData> for PendingShareView {
    fn from(share: &ShareData) -> Self {
        Self {
            title: share.title.clone(),
            text: share.text.clone(),
            url: share.url.clone(),
            files: share
                .files
                .iter()
                .map(|f| FileView {
                    name: f.name.clone(),
                    mime_type: f.mime_type.clone(),
                    size: f.decoded_len(),
                })
                .collect(),
            timestamp: share.timestamp,
        }
    }
}

/// Activation response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationResponse {
    settings: RelaySettings,
    logs: Vec<LogEntry>,
    marker_found: bool,
    pending: Option<PendingShareView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    auto_relayed: Option<RelayResult>,
    /// Where the view should move to, with the pending marker removed
    location: String,
}

/// Pending share response.
#[derive(Debug, Serialize)]
pub struct PendingResponse {
    pending: Option<PendingShareView>,
}

/// Discard response.
#[derive(Debug, Serialize)]
pub struct DiscardResponse {
    discarded: bool,
}

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

// ============================================================================
// Capture handler
// ============================================================================

/// POST /share-target - Capture a share submitted by the OS share sheet.
///
/// Always redirects to the activation URL; capture problems are logged, not
/// returned.
pub async fn capture(State(state): State<SharedState>, mut multipart: Multipart) -> Redirect {
    let mut capture = ShareCapture::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Malformed share submission, keeping what was read: {}", e);
                break;
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(String::from);

        if name == FIELD_FILES || file_name.is_some() {
            let mime_type = field.content_type().map(String::from);
            match field.bytes().await {
                Ok(bytes) => capture.file(file_name.as_deref(), mime_type.as_deref(), &bytes),
                Err(e) => capture.drop_file(file_name.as_deref(), &e.to_string()),
            }
        } else {
            match field.text().await {
                Ok(value) => capture.text_field(&name, value),
                Err(e) => tracing::warn!(field = %name, "Unreadable share field: {}", e),
            }
        }
    }

    state.interceptor.store(capture);
    Redirect::to(&intercept::activation_url(""))
}

// ============================================================================
// Session handlers
// ============================================================================

/// GET / - Activate the foreground.
pub async fn activate(
    State(state): State<SharedState>,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<Json<ActivationResponse>> {
    let url = request_url(&uri.to_string())?;
    let session = state.session.clone();

    // An auto-relay must run to completion even if the client goes away.
    let activation = tokio::spawn(async move { session.activate(&url).await })
        .await
        .map_err(|e| ApiError::internal(format!("Activation task failed: {e}")))?;

    Ok(Json(ActivationResponse {
        settings: activation.settings,
        logs: activation.logs,
        marker_found: activation.marker_found,
        pending: activation.pending.as_ref().map(PendingShareView::from),
        auto_relayed: activation.auto_relayed,
        location: relative_location(&activation.location),
    }))
}

/// GET /api/pending - Re-read the handoff slot.
pub async fn get_pending(State(state): State<SharedState>) -> Json<PendingResponse> {
    Json(PendingResponse {
        pending: state.session.pending().as_ref().map(PendingShareView::from),
    })
}

/// POST /api/pending/relay - Relay the pending share and clear the slot.
pub async fn relay_pending(State(state): State<SharedState>) -> ApiResult<Json<RelayResult>> {
    let session = state.session.clone();

    // Detached so a client disconnect cannot leave the log entry pending.
    let result = tokio::spawn(async move { session.relay_pending().await })
        .await
        .map_err(|e| ApiError::internal(format!("Relay task failed: {e}")))??;

    Ok(Json(result))
}

/// DELETE /api/pending - Discard the pending share.
pub async fn discard_pending(State(state): State<SharedState>) -> ApiResult<Json<DiscardResponse>> {
    let discarded = state.session.discard_pending()?;
    Ok(Json(DiscardResponse { discarded }))
}

// ============================================================================
// Config handlers
// ============================================================================

/// GET /api/config - Load relay settings.
pub async fn get_config(State(state): State<SharedState>) -> Json<RelaySettings> {
    Json(state.session.settings())
}

/// PUT /api/config - Save relay settings.
pub async fn put_config(
    State(state): State<SharedState>,
    Json(settings): Json<RelaySettings>,
) -> ApiResult<Json<RelaySettings>> {
    settings.validate()?;
    state.session.save_settings(&settings)?;
    tracing::info!(auto_relay = settings.auto_relay, "Relay settings updated");
    Ok(Json(settings))
}

// ============================================================================
// Log handlers
// ============================================================================

/// GET /api/logs - List relay attempts, newest first.
pub async fn get_logs(State(state): State<SharedState>) -> Json<Vec<LogEntry>> {
    Json(state.session.logs())
}

/// DELETE /api/logs - Clear the relay log.
pub async fn clear_logs(State(state): State<SharedState>) -> ApiResult<StatusCode> {
    state.session.clear_logs()?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/health - Liveness check.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: crate::VERSION,
    })
}

// ============================================================================
// Helpers
// ============================================================================

fn request_url(path_and_query: &str) -> ApiResult<Url> {
    Url::parse("http://localhost/")
        .and_then(|base| base.join(path_and_query))
        .map_err(|e| ApiError::bad_request(format!("Invalid request URL: {e}")))
}

fn relative_location(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::share::SharedFile;

    #[test]
    fn test_pending_view_hides_file_bytes() {
        let share = ShareData::new()
            .with_title("Photo")
            .with_files(vec![SharedFile::from_bytes("a.png", "image/png", &[1, 2, 3, 4])]);

        let json = serde_json::to_value(PendingShareView::from(&share)).unwrap();
        assert_eq!(json["title"], "Photo");
        assert_eq!(json["files"][0]["name"], "a.png");
        assert_eq!(json["files"][0]["type"], "image/png");
        assert_eq!(json["files"][0]["size"], 4);
        assert!(json["files"][0].get("data").is_none());
    }

    #[test]
    fn test_relative_location() {
        let url = request_url("/?tab=logs&share-target=pending").unwrap();
        let (_, cleaned) = crate::session::strip_pending_marker(&url);
        assert_eq!(relative_location(&cleaned), "/?tab=logs");

        let (_, cleaned) = crate::session::strip_pending_marker(&request_url("/?share-target=pending").unwrap());
        assert_eq!(relative_location(&cleaned), "/");
    }
}
