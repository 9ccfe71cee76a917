/*
[INPUT]:  Previously displayed status (optional) and one raw TaskStatus observation
[OUTPUT]: Next displayed status and the transition it represents
[POS]:    Core layer - pure status reconciliation
[UPDATE]: When display fields or transition classification change
*/

use avopoint_adapter::{StatusKind, TaskStatus};

use crate::steps;

/// Error shown when the pipeline fails without a message.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Une erreur est survenue lors du traitement";

/// UI-facing view of a task status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayedStatus {
    pub task_id: String,
    pub status: StatusKind,
    /// Clamped to 0..=100, never lower than a previous non-terminal value.
    pub progress: u8,
    /// Registry message for the current step, or the raw service message.
    pub message: String,
    pub current_step: Option<String>,
    /// Index into `steps::ordered_thresholds()`.
    pub active_step: Option<usize>,
    pub error: Option<String>,
}

impl DisplayedStatus {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Identifier shown as the current step.
    pub fn step_label(&self) -> &str {
        self.current_step
            .as_deref()
            .unwrap_or_else(|| self.status.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    NoChange,
    Progressed,
    Completed,
    Failed { error: String },
}

impl Transition {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Transition::Completed | Transition::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub displayed: DisplayedStatus,
    pub transition: Transition,
}

pub fn clamp_progress(raw: i32) -> u8 {
    raw.clamp(0, 100) as u8
}

/// Derive the next displayed status from the previous one and a new observation.
///
/// A terminal previous status is sticky, and an observation for another task
/// is ignored; both yield `NoChange` with the previous value.
pub fn reconcile(previous: Option<&DisplayedStatus>, incoming: &TaskStatus) -> Reconciled {
    if let Some(previous) = previous
        && (previous.is_terminal() || previous.task_id != incoming.task_id)
    {
        return Reconciled {
            displayed: previous.clone(),
            transition: Transition::NoChange,
        };
    }

    let mut progress = clamp_progress(incoming.progress);
    if let Some(previous) = previous
        && !incoming.is_terminal()
        && progress < previous.progress
    {
        progress = previous.progress;
    }

    let message = steps::describe(incoming.current_step.as_deref(), &incoming.message).to_string();

    let error = (incoming.status == StatusKind::Failed).then(|| {
        incoming
            .failure()
            .map(str::trim)
            .filter(|error| !error.is_empty())
            .unwrap_or(DEFAULT_FAILURE_MESSAGE)
            .to_string()
    });

    let displayed = DisplayedStatus {
        task_id: incoming.task_id.clone(),
        status: incoming.status,
        progress,
        message,
        current_step: incoming.current_step.clone(),
        active_step: steps::active_step_index(progress),
        error,
    };

    let transition = match incoming.status {
        StatusKind::Completed => Transition::Completed,
        StatusKind::Failed => Transition::Failed {
            error: displayed
                .error
                .clone()
                .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
        },
        _ => match previous {
            Some(previous) if *previous == displayed => Transition::NoChange,
            _ => Transition::Progressed,
        },
    };

    Reconciled {
        displayed,
        transition,
    }
}
