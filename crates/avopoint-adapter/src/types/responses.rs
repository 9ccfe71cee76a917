/*
[INPUT]:  Pipeline service schema definitions and serde requirements
[OUTPUT]: Typed Rust response structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use serde::{Deserialize, Serialize};

use super::models::TaskSummary;

/// Body of a successful `POST /api/v1/process-documents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub task_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskList {
    #[serde(default)]
    pub tasks: Vec<TaskSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteTaskResponse {
    pub message: String,
}

/// FastAPI error body (`{"detail": "..."}`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct ErrorDetail {
    pub detail: serde_json::Value,
}

impl ErrorDetail {
    pub(crate) fn into_message(self) -> String {
        match self.detail {
            serde_json::Value::String(message) => message,
            other => other.to_string(),
        }
    }
}
