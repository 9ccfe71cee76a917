/*
[INPUT]:  DocumentSet from the user, TaskBackend (submit, poll, download), poll events
[OUTPUT]: Session phase, reconciled DisplayedStatus, downloadable artifact
[POS]:    Core layer - tracking session lifecycle
[UPDATE]: When phases, allowed transitions, or poller ownership change
*/

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use avopoint_adapter::{AvopointClient, AvopointError, DocumentBundle, DocumentSet, TaskStatus};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::poller::{DEFAULT_POLL_INTERVAL, EpisodeId, StatusPoller, StatusSource};
use crate::reconcile::{DisplayedStatus, Reconciled, Transition, reconcile};

/// Backend operations the session needs beyond status polling.
#[async_trait]
pub trait TaskBackend: StatusSource {
    /// Submit a complete bundle and return the new task id.
    async fn submit(&self, bundle: &DocumentBundle) -> avopoint_adapter::Result<String>;

    async fn fetch_result(&self, task_id: &str) -> avopoint_adapter::Result<Vec<u8>>;
}

#[async_trait]
impl TaskBackend for AvopointClient {
    async fn submit(&self, bundle: &DocumentBundle) -> avopoint_adapter::Result<String> {
        self.process_documents(bundle)
            .await
            .map(|response| response.task_id)
    }

    async fn fetch_result(&self, task_id: &str) -> avopoint_adapter::Result<Vec<u8>> {
        self.task_result(task_id).await
    }
}

/// Why tracking of a task ended without a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackingFailure {
    /// The pipeline reported FAILED; the message is shown verbatim.
    #[error("{0}")]
    Pipeline(String),
    #[error("Status polling failed: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Collecting,
    Submitting,
    Tracking(String),
    Finished(String),
    Failed(String, TrackingFailure),
}

impl SessionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            SessionPhase::Collecting => "collecting",
            SessionPhase::Submitting => "submitting",
            SessionPhase::Tracking(_) => "tracking",
            SessionPhase::Finished(_) => "finished",
            SessionPhase::Failed(..) => "failed",
        }
    }

    /// Task bound to this phase, if any.
    pub fn task_id(&self) -> Option<&str> {
        match self {
            SessionPhase::Tracking(task_id)
            | SessionPhase::Finished(task_id)
            | SessionPhase::Failed(task_id, _) => Some(task_id),
            SessionPhase::Collecting | SessionPhase::Submitting => None,
        }
    }

    pub fn can_transition(&self, action: &SessionAction) -> bool {
        matches!(
            (self, action),
            (SessionPhase::Collecting, SessionAction::Submit)
                | (SessionPhase::Submitting, SessionAction::Accepted(_))
                | (SessionPhase::Submitting, SessionAction::Rejected)
                | (SessionPhase::Tracking(_), SessionAction::Completed)
                | (SessionPhase::Tracking(_), SessionAction::Failed(_))
                | (_, SessionAction::Reset)
        )
    }

    /// Next phase for `action`, or an error when the action is not allowed here.
    pub fn transition(&self, action: SessionAction) -> Result<SessionPhase, StateError> {
        let next = match (self, &action) {
            (SessionPhase::Collecting, SessionAction::Submit) => Some(SessionPhase::Submitting),
            (SessionPhase::Submitting, SessionAction::Accepted(task_id)) => {
                Some(SessionPhase::Tracking(task_id.clone()))
            }
            (SessionPhase::Submitting, SessionAction::Rejected) => Some(SessionPhase::Collecting),
            (SessionPhase::Tracking(task_id), SessionAction::Completed) => {
                Some(SessionPhase::Finished(task_id.clone()))
            }
            (SessionPhase::Tracking(task_id), SessionAction::Failed(failure)) => {
                Some(SessionPhase::Failed(task_id.clone(), failure.clone()))
            }
            (_, SessionAction::Reset) => Some(SessionPhase::Collecting),
            _ => None,
        };
        next.ok_or_else(|| StateError::InvalidTransition {
            from: self.clone(),
            action,
        })
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.task_id() {
            Some(task_id) => write!(f, "{}({task_id})", self.name()),
            None => f.write_str(self.name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    Submit,
    Accepted(String),
    Rejected,
    Completed,
    Failed(TrackingFailure),
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("Invalid transition: {from} -> {action:?}")]
    InvalidTransition {
        from: SessionPhase,
        action: SessionAction,
    },
}

#[derive(Debug, Error)]
pub enum SessionError {
    /// Incomplete document set; nothing was sent.
    #[error("{0}")]
    Validation(AvopointError),
    #[error("{0}")]
    Transport(AvopointError),
    #[error(transparent)]
    InvalidState(#[from] StateError),
    #[error("No finished task to download")]
    NotFinished,
}

impl From<AvopointError> for SessionError {
    fn from(err: AvopointError) -> Self {
        if err.is_validation_error() {
            SessionError::Validation(err)
        } else {
            SessionError::Transport(err)
        }
    }
}

/// What a poller delivered.
#[derive(Debug)]
pub enum PollEvent {
    Observation(TaskStatus),
    TransportError(AvopointError),
}

/// A poll event tagged with the episode that produced it.
#[derive(Debug)]
pub struct EpisodeEvent {
    pub episode: EpisodeId,
    pub event: PollEvent,
}

/// Outcome of applying one event of the current episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    Unchanged,
    Progressed,
    Finished { task_id: String },
    Failed { task_id: String, failure: TrackingFailure },
}

impl SessionUpdate {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionUpdate::Finished { .. } | SessionUpdate::Failed { .. })
    }
}

/// One document submission and the tracking of its task.
pub struct TrackingSession<B: TaskBackend> {
    backend: Arc<B>,
    poll_interval: Duration,
    phase: SessionPhase,
    poller: Option<StatusPoller>,
    displayed: Option<DisplayedStatus>,
    last_error: Option<String>,
    events_tx: mpsc::UnboundedSender<EpisodeEvent>,
    events_rx: mpsc::UnboundedReceiver<EpisodeEvent>,
}

impl<B: TaskBackend> TrackingSession<B> {
    pub fn new(backend: Arc<B>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            poll_interval: DEFAULT_POLL_INTERVAL,
            phase: SessionPhase::Collecting,
            poller: None,
            displayed: None,
            last_error: None,
            events_tx,
            events_rx,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn displayed(&self) -> Option<&DisplayedStatus> {
        self.displayed.as_ref()
    }

    /// Error of the last rejected submission, shown while collecting.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(StatusPoller::is_active)
    }

    /// Task whose result can be downloaded.
    pub fn artifact(&self) -> Option<&str> {
        match &self.phase {
            SessionPhase::Finished(task_id) => Some(task_id),
            _ => None,
        }
    }

    /// Validate and submit the documents, then start tracking the new task.
    ///
    /// Validation and transport failures leave the session collecting.
    pub async fn submit(&mut self, documents: &DocumentSet) -> Result<String, SessionError> {
        let submitting = self.phase.transition(SessionAction::Submit)?;

        let bundle = match documents.to_bundle() {
            Ok(bundle) => bundle,
            Err(err) => {
                tracing::warn!(error = %err, "submission rejected locally");
                self.last_error = Some(err.to_string());
                return Err(SessionError::Validation(err));
            }
        };

        self.set_phase(submitting);
        tracing::info!(bytes = bundle.total_bytes(), "submitting documents");

        match self.backend.submit(&bundle).await {
            Ok(task_id) => {
                self.last_error = None;
                self.advance(SessionAction::Accepted(task_id.clone()))?;
                Ok(task_id)
            }
            Err(err) => {
                tracing::warn!(error = %err, "document submission failed");
                self.last_error = Some(err.to_string());
                self.advance(SessionAction::Rejected)?;
                Err(err.into())
            }
        }
    }

    /// Wait for the next relevant update of the current episode.
    ///
    /// Returns `Ok(None)` when nothing is being tracked. Cancel safe.
    pub async fn next_update(&mut self) -> Result<Option<SessionUpdate>, SessionError> {
        while matches!(self.phase, SessionPhase::Tracking(_)) {
            let Some(event) = self.events_rx.recv().await else {
                break;
            };
            if let Some(update) = self.apply(event)? {
                return Ok(Some(update));
            }
        }
        Ok(None)
    }

    /// Apply one poll event. Events from a superseded episode yield `None`.
    pub fn apply(&mut self, event: EpisodeEvent) -> Result<Option<SessionUpdate>, SessionError> {
        let current = self.poller.as_ref().map(StatusPoller::episode);
        if current != Some(event.episode) {
            tracing::debug!(episode = %event.episode, "discarding event from superseded episode");
            return Ok(None);
        }
        let SessionPhase::Tracking(task_id) = &self.phase else {
            return Ok(None);
        };
        let task_id = task_id.clone();

        let failure = match event.event {
            PollEvent::Observation(status) => {
                let Reconciled {
                    displayed,
                    transition,
                } = reconcile(self.displayed.as_ref(), &status);
                self.displayed = Some(displayed);

                match transition {
                    Transition::NoChange => return Ok(Some(SessionUpdate::Unchanged)),
                    Transition::Progressed => return Ok(Some(SessionUpdate::Progressed)),
                    Transition::Completed => {
                        self.advance(SessionAction::Completed)?;
                        tracing::info!(task_id = %task_id, "task completed");
                        return Ok(Some(SessionUpdate::Finished { task_id }));
                    }
                    Transition::Failed { error } => TrackingFailure::Pipeline(error),
                }
            }
            PollEvent::TransportError(err) => TrackingFailure::Transport(err.to_string()),
        };

        tracing::warn!(task_id = %task_id, failure = %failure, "task tracking failed");
        self.advance(SessionAction::Failed(failure.clone()))?;
        Ok(Some(SessionUpdate::Failed { task_id, failure }))
    }

    /// Drop the current task and return to collecting. Safe at any time.
    pub fn reset(&mut self) {
        self.set_phase(SessionPhase::Collecting);
        self.displayed = None;
        self.last_error = None;
        while self.events_rx.try_recv().is_ok() {}
    }

    /// Download the artifact of the finished task.
    pub async fn fetch_result(&self) -> Result<Vec<u8>, SessionError> {
        let task_id = self.artifact().ok_or(SessionError::NotFinished)?;
        let bytes = self
            .backend
            .fetch_result(task_id)
            .await
            .map_err(SessionError::Transport)?;
        tracing::info!(task_id = %task_id, bytes = bytes.len(), "result downloaded");
        Ok(bytes)
    }

    fn advance(&mut self, action: SessionAction) -> Result<(), StateError> {
        let next = self.phase.transition(action)?;
        self.set_phase(next);
        Ok(())
    }

    /// The only place a poller is started or stopped.
    fn set_phase(&mut self, next: SessionPhase) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
        if let SessionPhase::Tracking(task_id) = &next {
            self.displayed = None;
            self.poller = Some(self.start_poller(task_id));
        }
        tracing::info!(from = %self.phase, to = %next, "session phase changed");
        self.phase = next;
    }

    fn start_poller(&self, task_id: &str) -> StatusPoller {
        let episode = EpisodeId::new();
        let observations = self.events_tx.clone();
        let errors = self.events_tx.clone();
        StatusPoller::start_episode(
            episode,
            self.backend.clone(),
            task_id,
            self.poll_interval,
            move |status| {
                let _ = observations.send(EpisodeEvent {
                    episode,
                    event: PollEvent::Observation(status),
                });
            },
            move |err| {
                let _ = errors.send(EpisodeEvent {
                    episode,
                    event: PollEvent::TransportError(err),
                });
            },
        )
    }
}
