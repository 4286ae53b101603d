use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use psgen_logging::{psgen_debug, psgen_warn};
use tokio_util::sync::CancellationToken;

use crate::poll::PollTimer;
use crate::{Backend, EngineEvent, Epoch, EventSink, GenerationRequest, UploadTarget};

/// Executes backend requests as tasks on the current tokio runtime and
/// reports every outcome to the sink.
///
/// All methods return immediately. Only the progress loop is tracked:
/// it goes through a single `PollTimer`, so superseding or shutting down
/// drops the pending query deterministically.
pub struct EngineHandle {
    backend: Arc<dyn Backend>,
    sink: Arc<dyn EventSink>,
    poll_timer: PollTimer,
    download_dir: PathBuf,
    shutdown: CancellationToken,
}

impl EngineHandle {
    pub fn new(backend: Arc<dyn Backend>, sink: Arc<dyn EventSink>, download_dir: PathBuf) -> Self {
        Self {
            backend,
            sink,
            poll_timer: PollTimer::new(),
            download_dir,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn upload(&self, target: UploadTarget, attempt: u64, file: PathBuf) {
        let backend = self.backend.clone();
        self.spawn(async move {
            let result = backend.upload(target, &file).await;
            if let Err(err) = &result {
                psgen_warn!("upload {:?} attempt {} failed: {}", target, attempt, err);
            }
            EngineEvent::Uploaded {
                target,
                attempt,
                result,
            }
        });
    }

    pub fn generate(&self, epoch: Epoch, request: GenerationRequest) {
        let backend = self.backend.clone();
        self.spawn(async move {
            let result = backend.generate(&request).await;
            if let Err(err) = &result {
                psgen_warn!("generation for epoch {} failed: {}", epoch, err);
            }
            EngineEvent::Generated { epoch, result }
        });
    }

    /// Schedules the next progress query, replacing any pending one.
    pub fn poll_progress(&self, job_id: String, epoch: Epoch, delay: Duration) {
        if self.shutdown.is_cancelled() {
            return;
        }
        psgen_debug!("poll {} (epoch {}) in {:?}", job_id, epoch, delay);
        let backend = self.backend.clone();
        let sink = self.sink.clone();
        let query_id = job_id.clone();
        self.poll_timer.schedule(
            delay,
            async move { backend.progress(&query_id).await },
            move |result| {
                if let Err(err) = &result {
                    psgen_warn!("progress query for {} failed: {}", job_id, err);
                }
                sink.emit(EngineEvent::Progress {
                    job_id,
                    epoch,
                    result,
                });
            },
        );
    }

    pub fn cancel_poll(&self) {
        if self.poll_timer.cancel() {
            psgen_debug!("pending progress poll cancelled");
        }
    }

    pub fn download(&self, filename: String) {
        let backend = self.backend.clone();
        let dir = self.download_dir.clone();
        self.spawn(async move {
            let result = backend.download(&filename, &dir).await;
            if let Err(err) = &result {
                psgen_warn!("download of {} failed: {}", filename, err);
            }
            EngineEvent::ArtifactSaved { filename, result }
        });
    }

    /// Cancels the poll loop and every request still in flight. Nothing is
    /// emitted afterwards.
    pub fn shutdown(&self) {
        self.poll_timer.cancel();
        self.shutdown.cancel();
    }

    fn spawn<F>(&self, task: F)
    where
        F: std::future::Future<Output = EngineEvent> + Send + 'static,
    {
        if self.shutdown.is_cancelled() {
            return;
        }
        let sink = self.sink.clone();
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                event = task => {
                    if !shutdown.is_cancelled() {
                        sink.emit(event);
                    }
                }
            }
        });
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
