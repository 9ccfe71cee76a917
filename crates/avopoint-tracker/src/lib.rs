/*
[INPUT]:  Public API exports for avopoint-tracker crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod config;
pub mod poller;
pub mod reconcile;
pub mod render;
pub mod session;
pub mod steps;
pub mod view;

// Re-export main types for convenience
pub use config::TrackerConfig;
pub use poller::{DEFAULT_POLL_INTERVAL, EpisodeId, StatusPoller, StatusSource};
pub use reconcile::{DisplayedStatus, Reconciled, Transition, reconcile};
pub use session::{
    SessionError, SessionPhase, SessionUpdate, TaskBackend, TrackingFailure, TrackingSession,
};
pub use view::SessionView;
