/*
[INPUT]:  Session phase, reconciled DisplayedStatus, last submission error
[OUTPUT]: SessionView (exactly one of collecting/progress/success/failure)
[POS]:    Presentation layer - pure view model
[UPDATE]: When screens or timeline presentation change
*/

use crate::reconcile::DisplayedStatus;
use crate::session::{SessionPhase, TaskBackend, TrackingSession};
use crate::steps::{self, StepState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry {
    pub label: &'static str,
    pub threshold: u8,
    pub state: StepState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressView {
    pub task_id: String,
    pub percent: u8,
    pub message: String,
    pub step_label: String,
    pub timeline: Vec<TimelineEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionView {
    Collecting { last_error: Option<String> },
    Submitting,
    /// Tracking started, first status not received yet.
    Connecting { task_id: String },
    Progress(ProgressView),
    Success { task_id: String },
    Failure { task_id: String, error: String },
}

pub fn timeline(progress: u8) -> Vec<TimelineEntry> {
    steps::ordered_thresholds()
        .iter()
        .map(|descriptor| TimelineEntry {
            label: descriptor.timeline_label,
            threshold: descriptor.progress_threshold,
            state: steps::step_state(descriptor, progress),
        })
        .collect()
}

impl ProgressView {
    pub fn from_displayed(displayed: &DisplayedStatus) -> Self {
        Self {
            task_id: displayed.task_id.clone(),
            percent: displayed.progress,
            message: displayed.message.clone(),
            step_label: displayed.step_label().to_string(),
            timeline: timeline(displayed.progress),
        }
    }
}

impl SessionView {
    pub fn derive(
        phase: &SessionPhase,
        displayed: Option<&DisplayedStatus>,
        last_error: Option<&str>,
    ) -> Self {
        match phase {
            SessionPhase::Collecting => SessionView::Collecting {
                last_error: last_error.map(str::to_string),
            },
            SessionPhase::Submitting => SessionView::Submitting,
            SessionPhase::Tracking(task_id) => match displayed {
                Some(displayed) if displayed.task_id == *task_id => {
                    SessionView::Progress(ProgressView::from_displayed(displayed))
                }
                _ => SessionView::Connecting {
                    task_id: task_id.clone(),
                },
            },
            SessionPhase::Finished(task_id) => SessionView::Success {
                task_id: task_id.clone(),
            },
            SessionPhase::Failed(task_id, failure) => SessionView::Failure {
                task_id: task_id.clone(),
                error: failure.to_string(),
            },
        }
    }
}

impl<B: TaskBackend> TrackingSession<B> {
    pub fn view(&self) -> SessionView {
        SessionView::derive(self.phase(), self.displayed(), self.last_error())
    }
}
