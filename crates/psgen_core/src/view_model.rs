use std::path::PathBuf;

use crate::{DocumentKind, PollPhase, UploadPhase};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub slots: Vec<SlotView>,
    pub status: String,
    pub status_log: Vec<String>,
    pub progress_percent: u8,
    pub progress_status: String,
    pub poll_phase: PollPhase,
    pub job_id: Option<String>,
    pub updated_filename: Option<String>,
    pub can_generate: bool,
    pub notice: Option<String>,
    pub dirty: bool,
}

impl AppViewModel {
    pub fn slot(&self, kind: DocumentKind) -> Option<&SlotView> {
        self.slots.iter().find(|slot| slot.kind == kind)
    }

    pub fn can_download(&self) -> bool {
        self.updated_filename
            .as_deref()
            .is_some_and(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotView {
    pub kind: DocumentKind,
    pub file: Option<PathBuf>,
    pub remote_id: Option<String>,
    pub phase: UploadPhase,
}
