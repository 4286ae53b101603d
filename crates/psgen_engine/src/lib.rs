//! PSGen engine: backend IO and effect execution.
mod backend;
mod engine;
mod persist;
mod poll;
mod sink;
mod types;

pub use backend::{Backend, BackendSettings, ReqwestBackend};
pub use engine::EngineHandle;
pub use persist::{ensure_output_dir, ArtifactWriter, PersistError};
pub use poll::PollTimer;
pub use sink::{ChannelEventSink, EventSink};
pub use types::{
    BackendError, EngineEvent, Epoch, FailureKind, GenerationReceipt, GenerationRequest,
    ProgressReport, UploadReceipt, UploadTarget,
};
