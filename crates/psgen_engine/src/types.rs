use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub type Epoch = u64;

/// Upload endpoints of the backend, one per prerequisite document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadTarget {
    Ps,
    OldMockup,
    NewMockup,
}

impl UploadTarget {
    pub fn path(self) -> &'static str {
        match self {
            UploadTarget::Ps => "upload_ps",
            UploadTarget::OldMockup => "upload_old_mock",
            UploadTarget::NewMockup => "upload_new_mock",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadReceipt {
    pub doc_id: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub status_updates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub ps_doc_id: String,
    pub old_mock_id: String,
    pub new_mock_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenerationReceipt {
    pub job_id: String,
    #[serde(default)]
    pub updated_file: String,
    /// Absent and empty are kept apart: only an absent list leaves the log alone.
    #[serde(default)]
    pub status_updates: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ProgressReport {
    #[serde(default)]
    pub progress: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Uploaded {
        target: UploadTarget,
        attempt: u64,
        result: Result<UploadReceipt, BackendError>,
    },
    Generated {
        epoch: Epoch,
        result: Result<GenerationReceipt, BackendError>,
    },
    Progress {
        job_id: String,
        epoch: Epoch,
        result: Result<ProgressReport, BackendError>,
    },
    ArtifactSaved {
        filename: String,
        result: Result<PathBuf, BackendError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct BackendError {
    pub kind: FailureKind,
    pub message: String,
}

impl BackendError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
    Io,
    InvalidFilename,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::Io => write!(f, "io error"),
            FailureKind::InvalidFilename => write!(f, "invalid filename"),
        }
    }
}
