/*
[INPUT]:  Validated DocumentBundle (four labeled binary documents)
[OUTPUT]: Task identifier for the started pipeline run
[POS]:    HTTP layer - document submission endpoint
[UPDATE]: When the multipart layout or submission response changes
*/

use reqwest::Method;
use reqwest::multipart::{Form, Part};

use crate::http::{AvopointClient, AvopointError, Result};
use crate::types::{DocumentBundle, DocumentSet, SubmitResponse};

impl AvopointClient {
    /// Submit the four documents and start a pipeline run
    ///
    /// POST /api/v1/process-documents (multipart: contravention, certificat, permis, domicile)
    pub async fn process_documents(&self, bundle: &DocumentBundle) -> Result<SubmitResponse> {
        let form = build_form(bundle)?;
        tracing::info!(
            documents = 4,
            total_bytes = bundle.total_bytes(),
            "submitting document bundle"
        );

        let builder = self
            .api_request(Method::POST, &["api", "v1", "process-documents"])?
            .multipart(form);
        let response: SubmitResponse = self.send_json(builder).await?;

        if response.task_id.trim().is_empty() {
            return Err(AvopointError::InvalidResponse(
                "submission response carries an empty task_id".to_string(),
            ));
        }

        tracing::info!(task_id = %response.task_id, "document bundle accepted");
        Ok(response)
    }

    /// Validate a possibly incomplete selection, then submit it.
    ///
    /// An incomplete set fails with `MissingDocuments` before any request is sent.
    pub async fn submit_documents(&self, documents: &DocumentSet) -> Result<SubmitResponse> {
        let bundle = documents.to_bundle()?;
        self.process_documents(&bundle).await
    }
}

fn build_form(bundle: &DocumentBundle) -> Result<Form> {
    let mut form = Form::new();
    for (kind, document) in bundle.iter() {
        let part = Part::bytes(document.bytes.clone())
            .file_name(document.file_name.clone())
            .mime_str(&document.content_type)?;
        form = form.part(kind.field_name(), part);
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use crate::http::{AvopointError, ClientConfig, AvopointClient};
    use crate::types::{Document, DocumentKind, DocumentSet};
    use wiremock::matchers::{header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn complete_set() -> DocumentSet {
        DocumentKind::ALL.into_iter().fold(DocumentSet::new(), |set, kind| {
            set.with(
                kind,
                Document::new(
                    format!("{}.pdf", kind.field_name()),
                    "application/pdf",
                    format!("%PDF {}", kind.field_name()).into_bytes(),
                ),
            )
        })
    }

    #[tokio::test]
    async fn test_process_documents_posts_all_parts() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/process-documents"))
            .and(header_regex("content-type", "^multipart/form-data; boundary="))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "task_id": "t1",
                "status": "processing",
                "message": "Documents reçus et traitement démarré",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            AvopointClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
                .expect("client init");
        let response = client
            .submit_documents(&complete_set())
            .await
            .expect("submit documents");
        assert_eq!(response.task_id, "t1");

        let requests = server.received_requests().await.expect("recorded requests");
        let body = String::from_utf8_lossy(&requests[0].body);
        for kind in DocumentKind::ALL {
            assert!(
                body.contains(&format!("name=\"{}\"", kind.field_name())),
                "missing part {kind}"
            );
            assert!(body.contains(&format!("%PDF {}", kind.field_name())));
        }
    }

    #[tokio::test]
    async fn test_incomplete_set_never_reaches_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client =
            AvopointClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
                .expect("client init");
        let mut documents = complete_set();
        documents.remove(DocumentKind::Domicile);

        let err = client
            .submit_documents(&documents)
            .await
            .expect_err("incomplete set must be rejected");
        assert!(matches!(
            err,
            AvopointError::MissingDocuments { ref missing } if missing == &vec![DocumentKind::Domicile]
        ));
    }

    #[tokio::test]
    async fn test_rejected_submission_surfaces_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/process-documents"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "detail": "Type de fichier non supporté pour permis: text/plain",
            })))
            .mount(&server)
            .await;

        let client =
            AvopointClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
                .expect("client init");
        let err = client
            .submit_documents(&complete_set())
            .await
            .expect_err("rejected submission");

        assert!(err.is_transport_error());
        match err {
            AvopointError::Api { code, message } => {
                assert_eq!(code, 400);
                assert_eq!(message, "Type de fichier non supporté pour permis: text/plain");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_task_id_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/process-documents"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "task_id": "" })),
            )
            .mount(&server)
            .await;

        let client =
            AvopointClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
                .expect("client init");
        let err = client
            .submit_documents(&complete_set())
            .await
            .expect_err("empty task id");
        assert!(matches!(err, AvopointError::InvalidResponse(_)));
    }
}
