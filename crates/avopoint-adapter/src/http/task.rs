/*
[INPUT]:  Task identifiers returned by document submission
[OUTPUT]: Task status snapshots, result artifacts, task listing and deletion
[POS]:    HTTP layer - per-task endpoints
[UPDATE]: When adding task endpoints or changing response format
*/

use crate::http::{AvopointClient, Result};
use crate::types::{DeleteTaskResponse, TaskList, TaskStatus};
use reqwest::Method;

impl AvopointClient {
    /// Query the current status of a task
    ///
    /// GET /api/v1/task/{task_id}/status
    pub async fn task_status(&self, task_id: &str) -> Result<TaskStatus> {
        let builder = self.api_request(Method::GET, &["api", "v1", "task", task_id, "status"])?;
        self.send_json(builder).await
    }

    /// Download the final artifact of a completed task
    ///
    /// GET /api/v1/task/{task_id}/result
    pub async fn task_result(&self, task_id: &str) -> Result<Vec<u8>> {
        let builder = self.api_request(Method::GET, &["api", "v1", "task", task_id, "result"])?;
        let bytes = self.send_bytes(builder).await?;
        tracing::info!(task_id = %task_id, bytes = bytes.len(), "task result downloaded");
        Ok(bytes)
    }

    /// Delete a task and its files on the service
    ///
    /// DELETE /api/v1/task/{task_id}
    pub async fn delete_task(&self, task_id: &str) -> Result<DeleteTaskResponse> {
        let builder = self.api_request(Method::DELETE, &["api", "v1", "task", task_id])?;
        self.send_json(builder).await
    }

    /// List every task known to the service
    ///
    /// GET /api/v1/tasks
    pub async fn list_tasks(&self) -> Result<TaskList> {
        let builder = self.api_request(Method::GET, &["api", "v1", "tasks"])?;
        self.send_json(builder).await
    }
}
