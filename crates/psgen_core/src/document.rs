use std::fmt;
use std::path::{Path, PathBuf};

/// The three prerequisite documents a generation request needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocumentKind {
    OldPs,
    OldMockup,
    NewMockup,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [
        DocumentKind::OldPs,
        DocumentKind::OldMockup,
        DocumentKind::NewMockup,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::OldPs => "Old PS",
            DocumentKind::OldMockup => "Old Mockup",
            DocumentKind::NewMockup => "New Mockup",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            DocumentKind::OldPs => 0,
            DocumentKind::OldMockup => 1,
            DocumentKind::NewMockup => 2,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadPhase {
    #[default]
    Empty,
    Selected,
    Uploading,
    Uploaded,
    Failed,
}

/// Per-kind holder of the local file and, once uploaded, the backend id.
///
/// `remote_id` is only ever written by a successful upload whose attempt
/// number matches the slot's current attempt, so it always belongs to the
/// file currently held in `local_file`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSlot {
    kind: DocumentKind,
    local_file: Option<PathBuf>,
    remote_id: Option<String>,
    phase: UploadPhase,
    attempt: u64,
}

impl DocumentSlot {
    pub fn new(kind: DocumentKind) -> Self {
        Self {
            kind,
            local_file: None,
            remote_id: None,
            phase: UploadPhase::Empty,
            attempt: 0,
        }
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn local_file(&self) -> Option<&Path> {
        self.local_file.as_deref()
    }

    pub fn remote_id(&self) -> Option<&str> {
        self.remote_id.as_deref()
    }

    pub fn phase(&self) -> UploadPhase {
        self.phase
    }

    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// Replaces the local file. Any id from a previous upload no longer
    /// describes this slot, and in-flight uploads become stale.
    pub(crate) fn select(&mut self, file: Option<PathBuf>) {
        self.phase = if file.is_some() {
            UploadPhase::Selected
        } else {
            UploadPhase::Empty
        };
        self.local_file = file;
        self.remote_id = None;
        self.attempt += 1;
    }

    pub(crate) fn start_attempt(&mut self) -> u64 {
        self.attempt += 1;
        self.phase = UploadPhase::Uploading;
        self.attempt
    }

    pub(crate) fn is_current(&self, attempt: u64) -> bool {
        self.attempt == attempt && self.phase == UploadPhase::Uploading
    }

    pub(crate) fn mark_uploaded(&mut self, remote_id: String) {
        self.remote_id = Some(remote_id);
        self.phase = UploadPhase::Uploaded;
    }

    pub(crate) fn mark_failed(&mut self) {
        self.remote_id = None;
        self.phase = UploadPhase::Failed;
    }
}
