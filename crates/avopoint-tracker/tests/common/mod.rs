/*
[INPUT]:  Mock pipeline service and session configuration
[OUTPUT]: Shared fixtures for session flow tests
[POS]:    Test infrastructure - shared across tracker integration tests
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for avopoint-tracker tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use avopoint_adapter::{AvopointClient, ClientConfig, Document, DocumentKind, DocumentSet};
use avopoint_tracker::{SessionUpdate, TrackingSession};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fast cadence so scenarios finish quickly against a real clock
pub const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Upper bound for any single awaited update
pub const UPDATE_TIMEOUT: Duration = Duration::from_secs(5);

pub fn session_for(server: &MockServer) -> TrackingSession<AvopointClient> {
    let client = AvopointClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
        .expect("client init");
    TrackingSession::new(Arc::new(client)).with_poll_interval(POLL_INTERVAL)
}

pub fn complete_document_set() -> DocumentSet {
    DocumentKind::ALL.into_iter().fold(DocumentSet::new(), |set, kind| {
        set.with(
            kind,
            Document::new(
                format!("{}.jpg", kind.field_name()),
                "image/jpeg",
                vec![0xFF, 0xD8, 0xFF, 0xE0],
            ),
        )
    })
}

/// Accept every submission with the given task id
pub async fn mount_submit(server: &MockServer, task_id: &str) {
    Mock::given(method("POST"))
        .and(path("/api/v1/process-documents"))
        .respond_with(submit_response(task_id))
        .mount(server)
        .await;
}

pub fn submit_response(task_id: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "task_id": task_id,
        "status": "processing",
        "message": "Documents reçus et traitement démarré",
    }))
}

pub fn status_path(task_id: &str) -> String {
    format!("/api/v1/task/{task_id}/status")
}

/// Status payload as produced by the pipeline service
pub fn status_json(task_id: &str, status: &str, progress: i32) -> serde_json::Value {
    serde_json::json!({
        "task_id": task_id,
        "status": status,
        "progress": progress,
        "message": format!("{status} en cours"),
        "current_step": status,
        "created_at": "2025-03-01T10:15:00.000000",
        "updated_at": "2025-03-01T10:15:01.000000",
        "error": null,
    })
}

/// Number of status requests the server received for a task
pub async fn status_requests(server: &MockServer, task_id: &str) -> usize {
    let status_path = status_path(task_id);
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == status_path)
        .count()
}

/// Next session update, failing the test instead of hanging
pub async fn next_update(session: &mut TrackingSession<AvopointClient>) -> SessionUpdate {
    tokio::time::timeout(UPDATE_TIMEOUT, session.next_update())
        .await
        .expect("update before timeout")
        .expect("session error")
        .expect("session is tracking")
}
