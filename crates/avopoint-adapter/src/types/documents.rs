/*
[INPUT]:  Caller-selected document files (name, bytes, content type)
[OUTPUT]: DocumentSet under construction and validated DocumentBundle
[POS]:    Data layer - submission payload before multipart encoding
[UPDATE]: When the required document list changes
*/

use std::path::Path;

use crate::http::{AvopointError, Result};

use super::enums::DocumentKind;

/// One binary document selected by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a document from disk, guessing its content type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("document")
            .to_string();
        let content_type = guess_content_type(path).to_string();
        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }

}

/// Content type for the formats the service accepts.
pub fn guess_content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Documents selected so far. May be incomplete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSet {
    contravention: Option<Document>,
    certificat: Option<Document>,
    permis: Option<Document>,
    domicile: Option<Document>,
}

impl DocumentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: DocumentKind, document: Document) -> Self {
        self.insert(kind, document);
        self
    }

    /// Store a document, returning the one it replaces.
    pub fn insert(&mut self, kind: DocumentKind, document: Document) -> Option<Document> {
        self.slot_mut(kind).replace(document)
    }

    pub fn remove(&mut self, kind: DocumentKind) -> Option<Document> {
        self.slot_mut(kind).take()
    }

    pub fn get(&self, kind: DocumentKind) -> Option<&Document> {
        match kind {
            DocumentKind::Contravention => self.contravention.as_ref(),
            DocumentKind::Certificat => self.certificat.as_ref(),
            DocumentKind::Permis => self.permis.as_ref(),
            DocumentKind::Domicile => self.domicile.as_ref(),
        }
    }

    pub fn missing(&self) -> Vec<DocumentKind> {
        DocumentKind::ALL
            .into_iter()
            .filter(|kind| self.get(*kind).is_none())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// Validate that all four documents are present.
    ///
    /// Nothing is cloned when a document is missing.
    pub fn to_bundle(&self) -> Result<DocumentBundle> {
        if !self.is_complete() {
            return Err(AvopointError::MissingDocuments {
                missing: self.missing(),
            });
        }
        self.clone().into_bundle()
    }

    pub fn into_bundle(self) -> Result<DocumentBundle> {
        match (self.contravention, self.certificat, self.permis, self.domicile) {
            (Some(contravention), Some(certificat), Some(permis), Some(domicile)) => {
                Ok(DocumentBundle {
                    contravention,
                    certificat,
                    permis,
                    domicile,
                })
            }
            (contravention, certificat, permis, domicile) => {
                let present = [
                    contravention.is_some(),
                    certificat.is_some(),
                    permis.is_some(),
                    domicile.is_some(),
                ];
                let missing = DocumentKind::ALL
                    .into_iter()
                    .zip(present)
                    .filter_map(|(kind, present)| (!present).then_some(kind))
                    .collect();
                Err(AvopointError::MissingDocuments { missing })
            }
        }
    }

    fn slot_mut(&mut self, kind: DocumentKind) -> &mut Option<Document> {
        match kind {
            DocumentKind::Contravention => &mut self.contravention,
            DocumentKind::Certificat => &mut self.certificat,
            DocumentKind::Permis => &mut self.permis,
            DocumentKind::Domicile => &mut self.domicile,
        }
    }
}

/// Complete set of the four required documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentBundle {
    contravention: Document,
    certificat: Document,
    permis: Document,
    domicile: Document,
}

impl DocumentBundle {
    pub fn get(&self, kind: DocumentKind) -> &Document {
        match kind {
            DocumentKind::Contravention => &self.contravention,
            DocumentKind::Certificat => &self.certificat,
            DocumentKind::Permis => &self.permis,
            DocumentKind::Domicile => &self.domicile,
        }
    }

    /// Documents in multipart field order.
    pub fn iter(&self) -> impl Iterator<Item = (DocumentKind, &Document)> {
        DocumentKind::ALL.into_iter().map(|kind| (kind, self.get(kind)))
    }

    pub fn total_bytes(&self) -> usize {
        self.iter().map(|(_, document)| document.bytes.len()).sum()
    }
}
