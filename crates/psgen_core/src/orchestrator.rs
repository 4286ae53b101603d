use crate::{
    AppState, DocumentKind, Effect, Epoch, GenerateRequest, GeneratedArtifact, Job, WorkflowError,
};

pub const GENERATING_MESSAGE: &str = "Generating New PS document (this may take a while)...";
pub const STARTING_STATUS: &str = "Starting...";
pub const GENERATION_ERROR_STATUS: &str = "Error generating New PS.";

impl AppState {
    /// Remote ids of all three slots, or the kinds still missing one.
    pub(crate) fn remote_ids(&self) -> Result<GenerateRequest, WorkflowError> {
        let missing: Vec<DocumentKind> = DocumentKind::ALL
            .into_iter()
            .filter(|kind| self.slot(*kind).remote_id().is_none())
            .collect();
        if !missing.is_empty() {
            return Err(WorkflowError::IncompletePrerequisites { missing });
        }

        let id = |kind| self.slot(kind).remote_id().unwrap_or_default().to_string();
        Ok(GenerateRequest {
            old_ps_id: id(DocumentKind::OldPs),
            old_mockup_id: id(DocumentKind::OldMockup),
            new_mockup_id: id(DocumentKind::NewMockup),
        })
    }

    /// Starts a generation attempt. The previous job, its pending poll and
    /// its artifact are dropped before the request goes out.
    pub(crate) fn begin_generate(&mut self) -> Result<Vec<Effect>, WorkflowError> {
        let request = self.remote_ids()?;

        let mut effects = Vec::with_capacity(2);
        if self.supersede_job() {
            effects.push(Effect::CancelPoll);
        }
        self.artifact = None;
        self.tracker.reset(STARTING_STATUS);
        self.status_log.replace([GENERATING_MESSAGE]);
        self.clear_notice();
        self.mark_dirty();

        effects.push(Effect::Generate {
            epoch: self.epoch,
            request,
        });
        Ok(effects)
    }

    /// Returns the first poll for the new job, or `None` for a stale response.
    pub(crate) fn apply_generate_success(
        &mut self,
        epoch: Epoch,
        job_id: String,
        filename: String,
        status_updates: Option<Vec<String>>,
    ) -> Option<Effect> {
        if epoch != self.epoch || self.job.is_some() {
            return None;
        }

        if !filename.is_empty() {
            self.artifact = Some(GeneratedArtifact { filename });
        }
        if let Some(status_updates) = status_updates {
            self.status_log.replace(status_updates);
        }
        self.mark_dirty();

        let delay = self.tracker.start();
        self.job = Some(Job {
            id: job_id.clone(),
            epoch,
        });
        Some(Effect::PollProgress {
            job_id,
            epoch,
            delay,
        })
    }

    pub(crate) fn apply_generate_failure(&mut self, epoch: Epoch, message: String) -> bool {
        if epoch != self.epoch || self.job.is_some() {
            return false;
        }
        self.tracker.reset(GENERATION_ERROR_STATUS);
        self.record_error(WorkflowError::Generation { message });
        true
    }

    /// Applies a progress payload for the live job. Reports for any other
    /// job or epoch are ignored.
    pub(crate) fn apply_progress(
        &mut self,
        job_id: &str,
        epoch: Epoch,
        progress: Option<i64>,
        status: Option<String>,
    ) -> Option<Effect> {
        if !self.is_live_job(job_id, epoch) || !self.tracker.is_polling() {
            return None;
        }
        let next = self.tracker.on_report(progress, status);
        self.mark_dirty();
        next.map(|delay| Effect::PollProgress {
            job_id: job_id.to_string(),
            epoch,
            delay,
        })
    }

    pub(crate) fn apply_progress_failure(
        &mut self,
        job_id: &str,
        epoch: Epoch,
        message: String,
    ) -> bool {
        if !self.is_live_job(job_id, epoch) || !self.tracker.on_failure() {
            return false;
        }
        self.last_error = Some(WorkflowError::ProgressQuery { message });
        self.mark_dirty();
        true
    }

    /// Stops everything tied to the current epoch.
    pub(crate) fn shutdown(&mut self) {
        if self.tracker.cancel() {
            self.mark_dirty();
        }
        self.epoch += 1;
    }

    fn is_live_job(&self, job_id: &str, epoch: Epoch) -> bool {
        self.job
            .as_ref()
            .is_some_and(|job| job.id == job_id && job.epoch == epoch)
            && epoch == self.epoch
    }

    /// Invalidates the current job, if any. Returns whether a poll was pending.
    fn supersede_job(&mut self) -> bool {
        self.epoch += 1;
        self.job = None;
        self.tracker.cancel()
    }
}

