use std::time::Duration;

use crate::view_model::{AppViewModel, SlotView};
use crate::{
    DocumentKind, DocumentSlot, GeneratedArtifact, Job, ProgressTracker, StatusLog, WorkflowError,
};

/// Monotonic counter tagging each generation attempt and its poll loop.
pub type Epoch = u64;

/// The single workflow session: slots, status log, live job and artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub(crate) slots: [DocumentSlot; 3],
    pub(crate) status_log: StatusLog,
    pub(crate) tracker: ProgressTracker,
    pub(crate) job: Option<Job>,
    pub(crate) artifact: Option<GeneratedArtifact>,
    pub(crate) epoch: Epoch,
    pub(crate) notice: Option<String>,
    pub(crate) last_error: Option<WorkflowError>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            slots: DocumentKind::ALL.map(DocumentSlot::new),
            status_log: StatusLog::new(),
            tracker: ProgressTracker::default(),
            job: None,
            artifact: None,
            epoch: 0,
            notice: None,
            last_error: None,
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_interval(interval: Duration) -> Self {
        Self {
            tracker: ProgressTracker::new(interval),
            ..Self::default()
        }
    }

    pub fn slot(&self, kind: DocumentKind) -> &DocumentSlot {
        &self.slots[kind.index()]
    }

    pub(crate) fn slot_mut(&mut self, kind: DocumentKind) -> &mut DocumentSlot {
        &mut self.slots[kind.index()]
    }

    pub fn status_log(&self) -> &StatusLog {
        &self.status_log
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    pub fn artifact(&self) -> Option<&GeneratedArtifact> {
        self.artifact.as_ref()
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// The most recent error, local or remote.
    pub fn last_error(&self) -> Option<&WorkflowError> {
        self.last_error.as_ref()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            slots: self
                .slots
                .iter()
                .map(|slot| SlotView {
                    kind: slot.kind(),
                    file: slot.local_file().map(ToOwned::to_owned),
                    remote_id: slot.remote_id().map(ToOwned::to_owned),
                    phase: slot.phase(),
                })
                .collect(),
            status: self.status_log.current().to_string(),
            status_log: self.status_log.entries().to_vec(),
            progress_percent: self.tracker.percent(),
            progress_status: self.tracker.status().to_string(),
            poll_phase: self.tracker.phase(),
            job_id: self.job.as_ref().map(|job| job.id.clone()),
            updated_filename: self.artifact.as_ref().map(|a| a.filename.clone()),
            can_generate: self.remote_ids().is_ok(),
            notice: self.notice.clone(),
            dirty: self.dirty,
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether the state changed since the last call, clearing the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Surfaces a failure. Local validation goes to the notice and leaves the
    /// status log alone; remote failures collapse the log to one message.
    pub(crate) fn record_error(&mut self, error: WorkflowError) {
        if error.is_local() {
            self.notice = Some(error.to_string());
        } else {
            self.notice = None;
            self.status_log.collapse(error.to_string());
        }
        self.last_error = Some(error);
        self.mark_dirty();
    }

    pub(crate) fn clear_notice(&mut self) {
        self.notice = None;
    }
}
