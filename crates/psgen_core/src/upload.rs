use std::path::PathBuf;

use crate::{AppState, DocumentKind, Effect, WorkflowError};

pub(crate) fn uploading_message(kind: DocumentKind) -> String {
    format!("Uploading {kind}...")
}

impl AppState {
    pub(crate) fn select_file(&mut self, kind: DocumentKind, file: Option<PathBuf>) {
        self.slot_mut(kind).select(file);
        self.clear_notice();
        self.mark_dirty();
    }

    /// Starts one upload. Without a selected file nothing is sent.
    pub(crate) fn begin_upload(&mut self, kind: DocumentKind) -> Result<Effect, WorkflowError> {
        let file = self
            .slot(kind)
            .local_file()
            .map(ToOwned::to_owned)
            .ok_or(WorkflowError::MissingInput { kind })?;

        let attempt = self.slot_mut(kind).start_attempt();
        self.status_log.replace([uploading_message(kind)]);
        self.clear_notice();
        self.mark_dirty();
        Ok(Effect::Upload {
            kind,
            file,
            attempt,
        })
    }

    /// Returns `false` when the result belongs to a superseded attempt.
    pub(crate) fn apply_upload_success(
        &mut self,
        kind: DocumentKind,
        attempt: u64,
        doc_id: String,
        status_updates: Vec<String>,
    ) -> bool {
        if !self.slot(kind).is_current(attempt) {
            return false;
        }
        self.slot_mut(kind).mark_uploaded(doc_id);
        if status_updates.is_empty() {
            self.status_log.replace([uploading_message(kind)]);
        } else {
            self.status_log.replace(status_updates);
        }
        self.mark_dirty();
        true
    }

    pub(crate) fn apply_upload_failure(
        &mut self,
        kind: DocumentKind,
        attempt: u64,
        message: String,
    ) -> bool {
        if !self.slot(kind).is_current(attempt) {
            return false;
        }
        self.slot_mut(kind).mark_failed();
        self.record_error(WorkflowError::Upload { kind, message });
        true
    }
}
