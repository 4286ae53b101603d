use std::path::PathBuf;

use crate::{DocumentKind, Epoch};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked (or cleared) the local file for a slot.
    FileSelected {
        kind: DocumentKind,
        file: Option<PathBuf>,
    },
    /// User asked to upload the selected file for a slot.
    UploadClicked(DocumentKind),
    /// Engine: upload accepted by the backend.
    UploadSucceeded {
        kind: DocumentKind,
        attempt: u64,
        doc_id: String,
        status_updates: Vec<String>,
    },
    /// Engine: upload failed.
    UploadFailed {
        kind: DocumentKind,
        attempt: u64,
        message: String,
    },
    /// User asked to generate the new PS document.
    GenerateClicked,
    /// Engine: generation request accepted and a job was started.
    GenerateSucceeded {
        epoch: Epoch,
        job_id: String,
        filename: String,
        /// `None` when the backend sent no `status_updates` field.
        status_updates: Option<Vec<String>>,
    },
    /// Engine: generation request failed.
    GenerateFailed { epoch: Epoch, message: String },
    /// Engine: a progress payload for a job.
    ProgressReported {
        job_id: String,
        epoch: Epoch,
        progress: Option<i64>,
        status: Option<String>,
    },
    /// Engine: a progress query failed.
    ProgressFailed {
        job_id: String,
        epoch: Epoch,
        message: String,
    },
    /// User asked to download the generated document.
    DownloadClicked,
    /// Front-end is going away; stop polling.
    Shutdown,
    /// Fallback for placeholder wiring.
    NoOp,
}
