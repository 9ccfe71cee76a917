/*
[INPUT]:  Error sources (HTTP, API, serialization, URL, document validation)
[OUTPUT]: Structured error types with transport/validation classification
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

use crate::types::DocumentKind;

/// Main error type for the pipeline adapter
#[derive(Error, Debug)]
pub enum AvopointError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status
    #[error("API error (HTTP {code}): {message}")]
    Api { code: u16, message: String },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Submission attempted with an incomplete document set
    #[error("Missing required documents: {}", format_kinds(missing))]
    MissingDocuments { missing: Vec<DocumentKind> },
}

impl AvopointError {
    /// Client-side validation failure; never reached the network.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, AvopointError::MissingDocuments { .. })
    }

    /// Network, HTTP status or body failure of an exchange with the service.
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            AvopointError::Http(_)
                | AvopointError::Api { .. }
                | AvopointError::Serialization(_)
                | AvopointError::InvalidResponse(_)
        )
    }

    /// Create an API error from status code and message
    pub fn api_error(status: StatusCode, message: impl Into<String>) -> Self {
        AvopointError::Api {
            code: status.as_u16(),
            message: message.into(),
        }
    }
}

fn format_kinds(kinds: &[DocumentKind]) -> String {
    kinds
        .iter()
        .map(DocumentKind::field_name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias for pipeline adapter operations
pub type Result<T> = std::result::Result<T, AvopointError>;
