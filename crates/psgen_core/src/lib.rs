//! PSGen core: pure workflow state machine and view-model helpers.
mod artifact;
mod document;
mod effect;
mod error;
mod msg;
mod orchestrator;
mod progress;
mod state;
mod status_log;
mod update;
mod upload;
mod view_model;

pub use artifact::GeneratedArtifact;
pub use document::{DocumentKind, DocumentSlot, UploadPhase};
pub use effect::{Effect, GenerateRequest};
pub use error::WorkflowError;
pub use msg::Msg;
pub use orchestrator::{GENERATING_MESSAGE, GENERATION_ERROR_STATUS, STARTING_STATUS};
pub use progress::{
    Job, PollPhase, ProgressTracker, DEFAULT_POLL_INTERVAL, PROGRESS_ERROR_STATUS,
};
pub use state::{AppState, Epoch};
pub use status_log::StatusLog;
pub use update::update;
pub use view_model::{AppViewModel, SlotView};
