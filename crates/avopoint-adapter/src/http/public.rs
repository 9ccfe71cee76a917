/*
[INPUT]:  None (service-level endpoints)
[OUTPUT]: Service health information
[POS]:    HTTP layer - public service endpoints
[UPDATE]: When adding new public endpoints or changing response format
*/

use crate::http::{AvopointClient, Result};
use crate::types::HealthStatus;
use reqwest::Method;

impl AvopointClient {
    /// Query service health
    ///
    /// GET /api/v1/health
    pub async fn health(&self) -> Result<HealthStatus> {
        let builder = self.api_request(Method::GET, &["api", "v1", "health"])?;
        self.send_json(builder).await
    }
}
