use crate::DocumentKind;

/// Everything that can go wrong in one workflow action.
///
/// The `Display` text is exactly what ends up in the status log or notice.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("Select {kind} (docx)")]
    MissingInput { kind: DocumentKind },
    #[error("Upload Old PS, Old Mockup, and New Mockup first.")]
    IncompletePrerequisites { missing: Vec<DocumentKind> },
    #[error("Error uploading {kind}: {message}")]
    Upload { kind: DocumentKind, message: String },
    #[error("Error generating New PS: {message}")]
    Generation { message: String },
    #[error("Error fetching progress: {message}")]
    ProgressQuery { message: String },
    #[error("No updated file")]
    NoArtifact,
}

impl WorkflowError {
    /// Local validation failures never reach the backend.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            WorkflowError::MissingInput { .. }
                | WorkflowError::IncompletePrerequisites { .. }
                | WorkflowError::NoArtifact
        )
    }
}
