use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use psgen_engine::{
    Backend, BackendError, EngineEvent, EngineHandle, EventSink, GenerationReceipt,
    GenerationRequest, PollTimer, ProgressReport, UploadReceipt, UploadTarget,
};

#[derive(Default)]
struct TestSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl TestSink {
    fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl EventSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Backend whose calls take `latency` of (paused) tokio time.
#[derive(Default)]
struct ScriptedBackend {
    latency: Duration,
    progress: Mutex<VecDeque<i64>>,
    progress_calls: AtomicUsize,
}

#[async_trait::async_trait]
impl Backend for ScriptedBackend {
    async fn upload(&self, target: UploadTarget, _file: &Path) -> Result<UploadReceipt, BackendError> {
        tokio::time::sleep(self.latency).await;
        Ok(UploadReceipt {
            doc_id: format!("{target:?}-id"),
            filename: None,
            status_updates: Vec::new(),
        })
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<GenerationReceipt, BackendError> {
        tokio::time::sleep(self.latency).await;
        Ok(GenerationReceipt {
            job_id: "j1".to_string(),
            updated_file: "out.docx".to_string(),
            status_updates: None,
        })
    }

    async fn progress(&self, _job_id: &str) -> Result<ProgressReport, BackendError> {
        self.progress_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        let next = self.progress.lock().unwrap().pop_front();
        Ok(ProgressReport {
            progress: next,
            status: Some("Working".to_string()),
        })
    }

    async fn download(&self, filename: &str, dest_dir: &Path) -> Result<PathBuf, BackendError> {
        Ok(dest_dir.join(filename))
    }
}

fn engine(backend: Arc<ScriptedBackend>, sink: Arc<TestSink>) -> EngineHandle {
    EngineHandle::new(backend, sink, PathBuf::from("downloads"))
}

#[tokio::test(start_paused = true)]
async fn scheduled_poll_delivers_after_delay() {
    let backend = Arc::new(ScriptedBackend {
        progress: Mutex::new(VecDeque::from([45])),
        ..ScriptedBackend::default()
    });
    let sink = Arc::new(TestSink::default());
    let engine = engine(backend.clone(), sink.clone());

    engine.poll_progress("j1".to_string(), 3, Duration::from_secs(1));
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(backend.progress_calls.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_millis(600)).await;
    let events = sink.take();
    assert_eq!(
        events,
        vec![EngineEvent::Progress {
            job_id: "j1".to_string(),
            epoch: 3,
            result: Ok(ProgressReport {
                progress: Some(45),
                status: Some("Working".to_string()),
            }),
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn cancelled_poll_never_queries_or_delivers() {
    let backend = Arc::new(ScriptedBackend::default());
    let sink = Arc::new(TestSink::default());
    let engine = engine(backend.clone(), sink.clone());

    engine.poll_progress("j1".to_string(), 1, Duration::from_secs(1));
    engine.cancel_poll();
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(backend.progress_calls.load(Ordering::SeqCst), 0);
    assert!(sink.take().is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancelling_in_flight_query_drops_its_result() {
    let backend = Arc::new(ScriptedBackend {
        latency: Duration::from_secs(2),
        ..ScriptedBackend::default()
    });
    let sink = Arc::new(TestSink::default());
    let engine = engine(backend.clone(), sink.clone());

    engine.poll_progress("j1".to_string(), 1, Duration::ZERO);
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(backend.progress_calls.load(Ordering::SeqCst), 1);

    engine.cancel_poll();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(sink.take().is_empty());
}

#[tokio::test(start_paused = true)]
async fn rescheduling_replaces_pending_poll() {
    let backend = Arc::new(ScriptedBackend {
        progress: Mutex::new(VecDeque::from([10, 20])),
        ..ScriptedBackend::default()
    });
    let sink = Arc::new(TestSink::default());
    let engine = engine(backend.clone(), sink.clone());

    engine.poll_progress("old".to_string(), 1, Duration::from_secs(1));
    engine.poll_progress("new".to_string(), 2, Duration::from_secs(1));
    tokio::time::sleep(Duration::from_secs(3)).await;

    assert_eq!(backend.progress_calls.load(Ordering::SeqCst), 1);
    let events = sink.take();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        EngineEvent::Progress { job_id, epoch: 2, .. } if job_id == "new"
    ));
}

#[tokio::test(start_paused = true)]
async fn shutdown_drops_in_flight_requests() {
    let backend = Arc::new(ScriptedBackend {
        latency: Duration::from_secs(1),
        ..ScriptedBackend::default()
    });
    let sink = Arc::new(TestSink::default());
    let engine = engine(backend.clone(), sink.clone());

    engine.upload(UploadTarget::Ps, 1, PathBuf::from("ps.docx"));
    engine.poll_progress("j1".to_string(), 1, Duration::from_millis(100));
    engine.shutdown();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(sink.take().is_empty());

    // Nothing new starts after shutdown either.
    engine.generate(
        2,
        GenerationRequest {
            ps_doc_id: "a".to_string(),
            old_mock_id: "b".to_string(),
            new_mock_id: "c".to_string(),
            similarity_threshold: None,
        },
    );
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(sink.take().is_empty());
}

#[tokio::test(start_paused = true)]
async fn upload_and_generate_report_their_tags() {
    let backend = Arc::new(ScriptedBackend::default());
    let sink = Arc::new(TestSink::default());
    let engine = engine(backend, sink.clone());

    engine.upload(UploadTarget::NewMockup, 7, PathBuf::from("new.docx"));
    tokio::time::sleep(Duration::from_millis(10)).await;
    engine.generate(
        4,
        GenerationRequest {
            ps_doc_id: "a".to_string(),
            old_mock_id: "b".to_string(),
            new_mock_id: "c".to_string(),
            similarity_threshold: None,
        },
    );
    tokio::time::sleep(Duration::from_millis(10)).await;

    let events = sink.take();
    assert!(matches!(
        &events[0],
        EngineEvent::Uploaded { target: UploadTarget::NewMockup, attempt: 7, result: Ok(receipt) }
            if receipt.doc_id == "NewMockup-id"
    ));
    assert!(matches!(
        &events[1],
        EngineEvent::Generated { epoch: 4, result: Ok(receipt) } if receipt.job_id == "j1"
    ));
}

#[tokio::test(start_paused = true)]
async fn poll_timer_cancel_reports_only_live_queries() {
    let timer = PollTimer::new();
    assert!(!timer.cancel());

    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = delivered.clone();
    timer.schedule(Duration::from_millis(10), async { 1 }, move |value| {
        counter.fetch_add(value, Ordering::SeqCst);
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(delivered.load(Ordering::SeqCst), 1);
    assert!(!timer.cancel());

    timer.schedule(Duration::from_secs(1), async { 1 }, |_| {});
    assert!(timer.cancel());
}
