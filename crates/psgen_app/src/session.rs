use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use psgen_core::{update, AppState, AppViewModel, DocumentKind, Effect, Msg, PollPhase, WorkflowError};
use psgen_engine::{
    Backend, BackendError, ChannelEventSink, EngineEvent, EngineHandle, ReqwestBackend,
};
use psgen_logging::psgen_debug;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::effects::{map_event, map_kind, EffectRunner};
use crate::AppConfig;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("backend setup failed: {0}")]
    Setup(#[source] BackendError),
    #[error("{0}")]
    Workflow(#[from] WorkflowError),
    #[error("download failed: {0}")]
    Download(#[source] BackendError),
    #[error("engine event channel closed")]
    Closed,
}

type Observer = Box<dyn FnMut(&AppViewModel) + Send>;

/// One workflow session: the core state, the engine executing its effects,
/// and the loop feeding engine outcomes back in.
///
/// Must be created inside a tokio runtime. Dropping the session cancels the
/// pending poll and every request still in flight.
pub struct Session {
    state: AppState,
    runner: EffectRunner,
    events: mpsc::UnboundedReceiver<EngineEvent>,
    observer: Option<Observer>,
}

impl Session {
    pub fn new(config: &AppConfig) -> Result<Self, SessionError> {
        let backend = ReqwestBackend::new(config.backend_settings()).map_err(SessionError::Setup)?;
        Ok(Self::with_backend(Arc::new(backend), config))
    }

    pub fn with_backend(backend: Arc<dyn Backend>, config: &AppConfig) -> Self {
        let (event_tx, events) = mpsc::unbounded_channel();
        let sink = Arc::new(ChannelEventSink::new(event_tx));
        let engine = EngineHandle::new(backend, sink, config.download_dir.clone());
        Self {
            state: AppState::with_poll_interval(config.poll_interval()),
            runner: EffectRunner::new(engine, config.similarity_threshold),
            events,
            observer: None,
        }
    }

    /// Called with the view model whenever the state changed.
    pub fn set_observer(&mut self, observer: impl FnMut(&AppViewModel) + Send + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }

    /// Applies `msg`, runs the resulting effects and returns a copy of them.
    pub fn dispatch(&mut self, msg: Msg) -> Vec<Effect> {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            if let Some(observer) = self.observer.as_mut() {
                observer(&state.view());
            }
        }
        self.state = state;
        self.runner.enqueue(effects.clone());
        effects
    }

    /// Waits for the next engine outcome, applies it and returns it.
    pub async fn pump(&mut self) -> Result<EngineEvent, SessionError> {
        let event = self.events.recv().await.ok_or(SessionError::Closed)?;
        if let Some(msg) = map_event(event.clone()) {
            self.dispatch(msg);
        }
        Ok(event)
    }

    pub fn select_file(&mut self, kind: DocumentKind, file: impl Into<PathBuf>) {
        self.dispatch(Msg::FileSelected {
            kind,
            file: Some(file.into()),
        });
    }

    /// Uploads the selected file for one slot and waits for the outcome.
    pub async fn upload(&mut self, kind: DocumentKind) -> Result<(), SessionError> {
        self.upload_many(&[kind]).await
    }

    /// Starts every upload at once and waits until all have resolved.
    /// Returns the first failure after the others have finished.
    pub async fn upload_many(&mut self, kinds: &[DocumentKind]) -> Result<(), SessionError> {
        let mut pending = BTreeMap::new();
        for &kind in kinds {
            match self.dispatch(Msg::UploadClicked(kind)).as_slice() {
                [Effect::Upload { attempt, .. }] => {
                    pending.insert(kind, *attempt);
                }
                _ => return Err(self.local_error(WorkflowError::MissingInput { kind })),
            }
        }

        let mut first_error = None;
        while !pending.is_empty() {
            if let EngineEvent::Uploaded {
                target,
                attempt,
                result,
            } = self.pump().await?
            {
                let kind = kinds
                    .iter()
                    .copied()
                    .find(|kind| map_kind(*kind) == target);
                let Some(kind) = kind else { continue };
                if pending.get(&kind) != Some(&attempt) {
                    continue;
                }
                pending.remove(&kind);
                if let Err(err) = result {
                    first_error.get_or_insert(WorkflowError::Upload {
                        kind,
                        message: err.message,
                    });
                }
            }
        }

        match first_error {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    /// Sends the generation request and waits for the backend's answer.
    /// On success the progress loop is already running.
    pub async fn generate(&mut self) -> Result<String, SessionError> {
        let epoch = match self
            .dispatch(Msg::GenerateClicked)
            .iter()
            .find_map(|effect| match effect {
                Effect::Generate { epoch, .. } => Some(*epoch),
                _ => None,
            }) {
            Some(epoch) => epoch,
            None => {
                return Err(self.local_error(WorkflowError::IncompletePrerequisites {
                    missing: Vec::new(),
                }))
            }
        };

        loop {
            if let EngineEvent::Generated { epoch: got, result } = self.pump().await? {
                if got != epoch {
                    continue;
                }
                return match result {
                    Ok(receipt) => Ok(receipt.job_id),
                    Err(err) => Err(WorkflowError::Generation {
                        message: err.message,
                    }
                    .into()),
                };
            }
        }
    }

    /// Processes events until the progress loop stops.
    pub async fn wait_for_job(&mut self) -> Result<PollPhase, SessionError> {
        while self.state.tracker().is_polling() {
            self.pump().await?;
        }
        Ok(self.state.tracker().phase())
    }

    /// Downloads the generated artifact and returns where it was saved.
    pub async fn download(&mut self) -> Result<PathBuf, SessionError> {
        let filename = match self.dispatch(Msg::DownloadClicked).as_slice() {
            [Effect::Download { filename }] => filename.clone(),
            _ => return Err(self.local_error(WorkflowError::NoArtifact)),
        };

        loop {
            if let EngineEvent::ArtifactSaved {
                filename: saved,
                result,
            } = self.pump().await?
            {
                if saved == filename {
                    return result.map_err(SessionError::Download);
                }
            }
        }
    }

    /// Stops polling and drops every outstanding request.
    pub fn shutdown(&mut self) {
        self.dispatch(Msg::Shutdown);
        self.runner.shutdown();
    }

    /// The error the core recorded, falling back to `fallback`.
    fn local_error(&self, fallback: WorkflowError) -> SessionError {
        let err = self.state.last_error().cloned().unwrap_or(fallback);
        psgen_debug!("rejected locally: {}", err);
        err.into()
    }
}
