use psgen_core::{DocumentKind, Effect, Msg};
use psgen_engine::{EngineEvent, EngineHandle, GenerationRequest, UploadTarget};
use psgen_logging::{psgen_debug, psgen_info};

/// Executes core effects on the engine.
pub struct EffectRunner {
    engine: EngineHandle,
    similarity_threshold: Option<f64>,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, similarity_threshold: Option<f64>) -> Self {
        Self {
            engine,
            similarity_threshold,
        }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Upload {
                    kind,
                    file,
                    attempt,
                } => {
                    psgen_info!("Upload kind={} attempt={} file={:?}", kind, attempt, file);
                    self.engine.upload(map_kind(kind), attempt, file);
                }
                Effect::Generate { epoch, request } => {
                    psgen_info!("Generate epoch={}", epoch);
                    self.engine.generate(
                        epoch,
                        GenerationRequest {
                            ps_doc_id: request.old_ps_id,
                            old_mock_id: request.old_mockup_id,
                            new_mock_id: request.new_mockup_id,
                            similarity_threshold: self.similarity_threshold,
                        },
                    );
                }
                Effect::PollProgress {
                    job_id,
                    epoch,
                    delay,
                } => {
                    self.engine.poll_progress(job_id, epoch, delay);
                }
                Effect::CancelPoll => self.engine.cancel_poll(),
                Effect::Download { filename } => {
                    psgen_info!("Download filename={}", filename);
                    self.engine.download(filename);
                }
            }
        }
    }

    pub fn shutdown(&self) {
        self.engine.shutdown();
    }
}

/// Translates an engine outcome into the message the core expects.
/// Saved artifacts carry no workflow state and map to nothing.
pub(crate) fn map_event(event: EngineEvent) -> Option<Msg> {
    let msg = match event {
        EngineEvent::Uploaded {
            target,
            attempt,
            result,
        } => {
            let kind = map_target(target);
            match result {
                Ok(receipt) => Msg::UploadSucceeded {
                    kind,
                    attempt,
                    doc_id: receipt.doc_id,
                    status_updates: receipt.status_updates,
                },
                Err(err) => Msg::UploadFailed {
                    kind,
                    attempt,
                    message: err.message,
                },
            }
        }
        EngineEvent::Generated { epoch, result } => match result {
            Ok(receipt) => Msg::GenerateSucceeded {
                epoch,
                job_id: receipt.job_id,
                filename: receipt.updated_file,
                status_updates: receipt.status_updates,
            },
            Err(err) => Msg::GenerateFailed {
                epoch,
                message: err.message,
            },
        },
        EngineEvent::Progress {
            job_id,
            epoch,
            result,
        } => match result {
            Ok(report) => Msg::ProgressReported {
                job_id,
                epoch,
                progress: report.progress,
                status: report.status,
            },
            Err(err) => Msg::ProgressFailed {
                job_id,
                epoch,
                message: err.message,
            },
        },
        EngineEvent::ArtifactSaved { filename, result } => {
            psgen_debug!("ArtifactSaved filename={} ok={}", filename, result.is_ok());
            return None;
        }
    };
    Some(msg)
}

pub(crate) fn map_kind(kind: DocumentKind) -> UploadTarget {
    match kind {
        DocumentKind::OldPs => UploadTarget::Ps,
        DocumentKind::OldMockup => UploadTarget::OldMockup,
        DocumentKind::NewMockup => UploadTarget::NewMockup,
    }
}

fn map_target(target: UploadTarget) -> DocumentKind {
    match target {
        UploadTarget::Ps => DocumentKind::OldPs,
        UploadTarget::OldMockup => DocumentKind::OldMockup,
        UploadTarget::NewMockup => DocumentKind::NewMockup,
    }
}
