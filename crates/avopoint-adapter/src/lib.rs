/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public document pipeline adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod http;
pub mod types;

// Re-export commonly used types from http
pub use http::{AvopointClient, AvopointError, ClientConfig, DEFAULT_BASE_URL, Result};

// Re-export all types
pub use types::*;
