use crate::{AppState, Effect, WorkflowError};

/// The file a successful generation response points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub filename: String,
}

impl AppState {
    /// Validates the artifact name and hands the download to the engine.
    pub(crate) fn request_download(&self) -> Result<Effect, WorkflowError> {
        match self.artifact() {
            Some(artifact) if !artifact.filename.is_empty() => Ok(Effect::Download {
                filename: artifact.filename.clone(),
            }),
            _ => Err(WorkflowError::NoArtifact),
        }
    }
}
