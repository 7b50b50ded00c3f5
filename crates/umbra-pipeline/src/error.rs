use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Renderer, scene or camera not available yet.
    MissingCollaborator(&'static str),
    TargetCreation { target: &'static str, width: i32, height: i32 },
}

impl PipelineError {
    pub fn reason(&self) -> &'static str {
        match self {
            PipelineError::MissingCollaborator(_) => "missing-collaborator",
            PipelineError::TargetCreation { .. } => "target-creation-failed",
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::MissingCollaborator(what) => {
                write!(f, "missing collaborator: {what}")
            }
            PipelineError::TargetCreation {
                target,
                width,
                height,
            } => write!(f, "could not create {target} target ({width}x{height})"),
        }
    }
}

impl std::error::Error for PipelineError {}
