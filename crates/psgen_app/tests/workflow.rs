use std::path::PathBuf;

use pretty_assertions::assert_eq;
use psgen_app::{AppConfig, Session, SessionError};
use psgen_core::{DocumentKind, PollPhase, UploadPhase, WorkflowError};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Fixture {
    server: MockServer,
    temp: tempfile::TempDir,
}

impl Fixture {
    async fn start() -> Self {
        Self {
            server: MockServer::start().await,
            temp: tempfile::TempDir::new().unwrap(),
        }
    }

    fn config(&self) -> AppConfig {
        AppConfig {
            base_url: self.server.uri(),
            poll_interval_ms: 10,
            download_dir: self.temp.path().join("downloads"),
            ..AppConfig::default()
        }
    }

    fn docx(&self, name: &str) -> PathBuf {
        let file = self.temp.path().join(name);
        std::fs::write(&file, b"PK\x03\x04fake docx").unwrap();
        file
    }

    fn select_all(&self, session: &mut Session) {
        session.select_file(DocumentKind::OldPs, self.docx("old_ps.docx"));
        session.select_file(DocumentKind::OldMockup, self.docx("old_mock.docx"));
        session.select_file(DocumentKind::NewMockup, self.docx("new_mock.docx"));
    }

    async fn mount_uploads(&self) {
        for (endpoint, doc_id) in [
            ("/upload_ps", "ps_1"),
            ("/upload_old_mock", "mock_old_1"),
            ("/upload_new_mock", "mock_new_1"),
        ] {
            Mock::given(method("POST"))
                .and(path(endpoint))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "doc_id": doc_id,
                    "status_updates": [format!("Stored {doc_id}")]
                })))
                .mount(&self.server)
                .await;
        }
    }

    async fn mount_generate(&self) {
        Mock::given(method("POST"))
            .and(path("/generate_new_ps"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "job_id": "job-1",
                "updated_file": "out.docx",
                "status_updates": ["Comparing mockups", "Writing document"]
            })))
            .expect(1)
            .mount(&self.server)
            .await;
    }
}

#[tokio::test]
async fn full_workflow_uploads_generates_polls_and_downloads() {
    let fixture = Fixture::start().await;
    fixture.mount_uploads().await;
    fixture.mount_generate().await;
    Mock::given(method("GET"))
        .and(path("/progress/job-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "progress": 50, "status": "Halfway" })),
        )
        .up_to_n_times(1)
        .mount(&fixture.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/progress/job-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "progress": 100, "status": "Done" })),
        )
        .mount(&fixture.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/download/out.docx"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"generated".to_vec()))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let config = fixture.config();
    let mut session = Session::new(&config).unwrap();
    fixture.select_all(&mut session);
    session.upload_many(&DocumentKind::ALL).await.unwrap();

    let view = session.view();
    for kind in DocumentKind::ALL {
        assert_eq!(view.slot(kind).unwrap().phase, UploadPhase::Uploaded);
    }
    assert!(view.can_generate);

    let job_id = session.generate().await.unwrap();
    assert_eq!(job_id, "job-1");
    assert_eq!(
        session.view().status_log,
        vec!["Comparing mockups", "Writing document"]
    );

    let phase = session.wait_for_job().await.unwrap();
    assert_eq!(phase, PollPhase::Complete);
    let view = session.view();
    assert_eq!(view.progress_percent, 100);
    assert_eq!(view.progress_status, "Done");
    assert_eq!(view.updated_filename.as_deref(), Some("out.docx"));

    let saved = session.download().await.unwrap();
    assert_eq!(saved, config.download_dir.join("out.docx"));
    assert_eq!(std::fs::read(&saved).unwrap(), b"generated");

    let progress_calls = fixture
        .server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path() == "/progress/job-1")
        .count();
    assert_eq!(progress_calls, 2);
    session.shutdown();
}

#[tokio::test]
async fn failed_upload_reports_backend_error_and_can_be_retried() {
    let fixture = Fixture::start().await;
    Mock::given(method("POST"))
        .and(path("/upload_ps"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "bad format" })))
        .up_to_n_times(1)
        .mount(&fixture.server)
        .await;
    fixture.mount_uploads().await;

    let mut session = Session::new(&fixture.config()).unwrap();
    session.select_file(DocumentKind::OldPs, fixture.docx("old_ps.docx"));

    let err = session.upload(DocumentKind::OldPs).await.unwrap_err();
    assert_eq!(err.to_string(), "Error uploading Old PS: bad format");
    let view = session.view();
    assert_eq!(view.status_log, vec!["Error uploading Old PS: bad format"]);
    assert_eq!(view.slot(DocumentKind::OldPs).unwrap().phase, UploadPhase::Failed);
    assert!(!view.can_generate);

    session.upload(DocumentKind::OldPs).await.unwrap();
    let view = session.view();
    assert_eq!(view.slot(DocumentKind::OldPs).unwrap().phase, UploadPhase::Uploaded);
    assert_eq!(view.status_log, vec!["Stored ps_1"]);
}

#[tokio::test]
async fn progress_failure_stops_polling_with_error_status() {
    let fixture = Fixture::start().await;
    fixture.mount_uploads().await;
    fixture.mount_generate().await;
    Mock::given(method("GET"))
        .and(path("/progress/job-1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let mut session = Session::new(&fixture.config()).unwrap();
    fixture.select_all(&mut session);
    session.upload_many(&DocumentKind::ALL).await.unwrap();
    session.generate().await.unwrap();

    let phase = session.wait_for_job().await.unwrap();
    assert_eq!(phase, PollPhase::Failed);
    let view = session.view();
    assert_eq!(view.progress_percent, 0);
    assert_eq!(view.progress_status, "Error fetching progress.");

    // Nothing is rescheduled after the failure.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    session.shutdown();
}

#[tokio::test]
async fn generate_without_uploads_is_rejected_locally() {
    let fixture = Fixture::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&fixture.server)
        .await;

    let mut session = Session::new(&fixture.config()).unwrap();
    let err = session.generate().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Workflow(WorkflowError::IncompletePrerequisites { .. })
    ));
    assert_eq!(
        session.view().notice.as_deref(),
        Some("Upload Old PS, Old Mockup, and New Mockup first.")
    );
}

#[tokio::test]
async fn upload_without_selected_file_sends_nothing() {
    let fixture = Fixture::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&fixture.server)
        .await;

    let mut session = Session::new(&fixture.config()).unwrap();
    let err = session.upload(DocumentKind::NewMockup).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Workflow(WorkflowError::MissingInput {
            kind: DocumentKind::NewMockup
        })
    ));
}

#[tokio::test]
async fn second_generate_supersedes_the_first_job() {
    let fixture = Fixture::start().await;
    fixture.mount_uploads().await;
    Mock::given(method("POST"))
        .and(path("/generate_new_ps"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job_id": "job-1",
            "updated_file": "first.docx"
        })))
        .up_to_n_times(1)
        .mount(&fixture.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/generate_new_ps"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job_id": "job-2",
            "updated_file": "second.docx"
        })))
        .mount(&fixture.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/progress/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "progress": 10 })))
        .mount(&fixture.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/progress/job-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "progress": 100 })))
        .mount(&fixture.server)
        .await;

    let mut session = Session::new(&fixture.config()).unwrap();
    fixture.select_all(&mut session);
    session.upload_many(&DocumentKind::ALL).await.unwrap();

    assert_eq!(session.generate().await.unwrap(), "job-1");
    assert_eq!(session.generate().await.unwrap(), "job-2");
    assert_eq!(session.wait_for_job().await.unwrap(), PollPhase::Complete);

    let view = session.view();
    assert_eq!(view.job_id.as_deref(), Some("job-2"));
    assert_eq!(view.updated_filename.as_deref(), Some("second.docx"));
    assert_eq!(view.progress_percent, 100);

    let job_one_polls = |requests: &[wiremock::Request]| {
        requests
            .iter()
            .filter(|request| request.url.path() == "/progress/job-1")
            .count()
    };
    let before = job_one_polls(&fixture.server.received_requests().await.unwrap());
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let after = job_one_polls(&fixture.server.received_requests().await.unwrap());
    assert!(before <= 1, "job-1 polled {before} times");
    assert_eq!(before, after);
    session.shutdown();
}
