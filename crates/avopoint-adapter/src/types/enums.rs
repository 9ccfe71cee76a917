/*
[INPUT]:  Pipeline service schema definitions and serde requirements
[OUTPUT]: Typed Rust enums with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When the pipeline adds steps or document kinds
*/

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pipeline step reported by `GET /api/v1/task/{task_id}/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusKind {
    Uploaded,
    ScanningContravention,
    ScanningCertificat,
    ScanningPermis,
    ScanningDomicile,
    Validating,
    FillingForm,
    RetrievingRadarImage,
    AnalyzingPhoto,
    GeneratingPdf,
    Completed,
    Failed,
}

impl StatusKind {
    pub const ALL: [StatusKind; 12] = [
        StatusKind::Uploaded,
        StatusKind::ScanningContravention,
        StatusKind::ScanningCertificat,
        StatusKind::ScanningPermis,
        StatusKind::ScanningDomicile,
        StatusKind::Validating,
        StatusKind::FillingForm,
        StatusKind::RetrievingRadarImage,
        StatusKind::AnalyzingPhoto,
        StatusKind::GeneratingPdf,
        StatusKind::Completed,
        StatusKind::Failed,
    ];

    /// Wire identifier, identical to the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKind::Uploaded => "UPLOADED",
            StatusKind::ScanningContravention => "SCANNING_CONTRAVENTION",
            StatusKind::ScanningCertificat => "SCANNING_CERTIFICAT",
            StatusKind::ScanningPermis => "SCANNING_PERMIS",
            StatusKind::ScanningDomicile => "SCANNING_DOMICILE",
            StatusKind::Validating => "VALIDATING",
            StatusKind::FillingForm => "FILLING_FORM",
            StatusKind::RetrievingRadarImage => "RETRIEVING_RADAR_IMAGE",
            StatusKind::AnalyzingPhoto => "ANALYZING_PHOTO",
            StatusKind::GeneratingPdf => "GENERATING_PDF",
            StatusKind::Completed => "COMPLETED",
            StatusKind::Failed => "FAILED",
        }
    }

    /// `COMPLETED` and `FAILED` end a task; nothing follows them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StatusKind::Completed | StatusKind::Failed)
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatusKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or(())
    }
}

/// The four documents a submission must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Avis de contravention
    Contravention,
    /// Certificat d'immatriculation
    Certificat,
    /// Permis de conduire
    Permis,
    /// Justificatif de domicile
    Domicile,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 4] = [
        DocumentKind::Contravention,
        DocumentKind::Certificat,
        DocumentKind::Permis,
        DocumentKind::Domicile,
    ];

    /// Multipart field name expected by `POST /api/v1/process-documents`.
    pub fn field_name(&self) -> &'static str {
        match self {
            DocumentKind::Contravention => "contravention",
            DocumentKind::Certificat => "certificat",
            DocumentKind::Permis => "permis",
            DocumentKind::Domicile => "domicile",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::Contravention => "Avis de contravention",
            DocumentKind::Certificat => "Certificat d'immatriculation",
            DocumentKind::Permis => "Permis de conduire",
            DocumentKind::Domicile => "Justificatif de domicile",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}
