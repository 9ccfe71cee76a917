/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for avopoint-adapter tests

use avopoint_adapter::{AvopointClient, ClientConfig, Document, DocumentKind, DocumentSet};
use wiremock::MockServer;

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Client pointed at a mock server
pub fn client_for(server: &MockServer) -> AvopointClient {
    AvopointClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
        .expect("client init")
}

/// Four small PDF documents
pub fn complete_document_set() -> DocumentSet {
    DocumentKind::ALL.into_iter().fold(DocumentSet::new(), |set, kind| {
        set.with(
            kind,
            Document::new(
                format!("{}.pdf", kind.field_name()),
                "application/pdf",
                b"%PDF-1.4 test".to_vec(),
            ),
        )
    })
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
