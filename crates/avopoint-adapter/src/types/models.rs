/*
[INPUT]:  Pipeline service schema definitions and serde requirements
[OUTPUT]: Typed Rust structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
[UPDATE]: Accept progress of -1 reported for failed tasks
*/

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::StatusKind;

/// Snapshot of one pipeline task as reported by the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub task_id: String,
    pub status: StatusKind,
    /// Nominally 0..=100; the service reports -1 once a task has failed.
    pub progress: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDateTime>,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Pipeline error message, only meaningful for `FAILED`.
    pub fn failure(&self) -> Option<&str> {
        if self.status == StatusKind::Failed {
            self.error.as_deref()
        } else {
            None
        }
    }
}

/// Entry of `GET /api/v1/tasks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub task_id: String,
    pub status: StatusKind,
    pub progress: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: NaiveDateTime,
    pub version: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
