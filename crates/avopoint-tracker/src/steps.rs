/*
[INPUT]:  Pipeline step identifiers (StatusKind or raw current_step strings)
[OUTPUT]: Display messages, ordered timeline thresholds, derived step states
[POS]:    Core layer - static step registry
[UPDATE]: When the pipeline adds, renames, or re-weights steps
*/

use avopoint_adapter::StatusKind;

/// Width of the window below a threshold in which a step counts as active.
pub const ACTIVE_WINDOW: u8 = 10;

/// One entry of the processing timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDescriptor {
    pub id: StatusKind,
    pub display_message: &'static str,
    pub timeline_label: &'static str,
    pub progress_threshold: u8,
}

const fn step(
    id: StatusKind,
    display_message: &'static str,
    timeline_label: &'static str,
    progress_threshold: u8,
) -> StepDescriptor {
    StepDescriptor {
        id,
        display_message,
        timeline_label,
        progress_threshold,
    }
}

static TIMELINE: [StepDescriptor; 11] = [
    step(
        StatusKind::Uploaded,
        "Documents reçus et vérifiés",
        "Réception et vérification des documents",
        5,
    ),
    step(
        StatusKind::ScanningContravention,
        "Extraction OCR de l'avis de contravention",
        "Extraction OCR avis de contravention",
        15,
    ),
    step(
        StatusKind::ScanningCertificat,
        "Extraction OCR du certificat d'immatriculation",
        "Extraction OCR certificat d'immatriculation",
        25,
    ),
    step(
        StatusKind::ScanningPermis,
        "Extraction OCR du permis de conduire",
        "Extraction OCR permis de conduire",
        35,
    ),
    step(
        StatusKind::ScanningDomicile,
        "Extraction OCR du justificatif de domicile",
        "Extraction OCR justificatif de domicile",
        45,
    ),
    step(
        StatusKind::Validating,
        "Validation croisée des données extraites",
        "Validation croisée des données",
        55,
    ),
    step(
        StatusKind::FillingForm,
        "Demande automatique d'image radar",
        "Demande d'image radar gouvernementale",
        65,
    ),
    step(
        StatusKind::RetrievingRadarImage,
        "Récupération de l'image du radar",
        "Récupération de l'image du radar",
        75,
    ),
    step(
        StatusKind::AnalyzingPhoto,
        "Analyse IA de la visibilité du conducteur",
        "Analyse IA de la visibilité du conducteur",
        85,
    ),
    step(
        StatusKind::GeneratingPdf,
        "Génération de la lettre de contestation",
        "Génération de la lettre de contestation",
        95,
    ),
    step(
        StatusKind::Completed,
        "Contestation prête à télécharger",
        "Contestation prête à télécharger",
        100,
    ),
];

const FAILED_MESSAGE: &str = "Erreur lors du traitement";

/// Timeline in ascending threshold order. Static configuration.
pub fn ordered_thresholds() -> &'static [StepDescriptor] {
    &TIMELINE
}

pub fn descriptor(kind: StatusKind) -> Option<&'static StepDescriptor> {
    TIMELINE.iter().find(|descriptor| descriptor.id == kind)
}

/// Canonical message for a known step.
pub fn message_for(kind: StatusKind) -> &'static str {
    match descriptor(kind) {
        Some(descriptor) => descriptor.display_message,
        None => FAILED_MESSAGE,
    }
}

/// Message for a raw step identifier, or `fallback` when it is absent or unknown.
pub fn describe<'a>(step: Option<&str>, fallback: &'a str) -> &'a str {
    match step.and_then(|raw| raw.parse::<StatusKind>().ok()) {
        Some(kind) => message_for(kind),
        None => fallback,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Completed,
    Active,
    Pending,
}

pub fn step_state(descriptor: &StepDescriptor, progress: u8) -> StepState {
    let threshold = descriptor.progress_threshold;
    if progress >= threshold {
        StepState::Completed
    } else if progress >= threshold.saturating_sub(ACTIVE_WINDOW) {
        StepState::Active
    } else {
        StepState::Pending
    }
}

/// Index of the first timeline entry that is active at `progress`.
pub fn active_step_index(progress: u8) -> Option<usize> {
    TIMELINE
        .iter()
        .position(|descriptor| step_state(descriptor, progress) == StepState::Active)
}
