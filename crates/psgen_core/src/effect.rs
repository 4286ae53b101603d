use std::path::PathBuf;
use std::time::Duration;

use crate::{DocumentKind, Epoch};

/// Side effects requested by `update`; the caller executes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Upload {
        kind: DocumentKind,
        file: PathBuf,
        attempt: u64,
    },
    Generate {
        epoch: Epoch,
        request: GenerateRequest,
    },
    /// Query progress for `job_id` once `delay` has elapsed. Replaces any
    /// query still waiting on its timer.
    PollProgress {
        job_id: String,
        epoch: Epoch,
        delay: Duration,
    },
    /// Drop the pending poll timer, if any.
    CancelPoll,
    Download {
        filename: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub old_ps_id: String,
    pub old_mockup_id: String,
    pub new_mockup_id: String,
}
