use umbra_scene::{DocId, PatchError};

#[derive(Debug)]
pub enum SourceError {
    MissingDocument(DocId),
    Patch { id: DocId, source: PatchError },
}

impl SourceError {
    /// Stable kebab-case reason for structured results.
    pub fn reason(&self) -> &'static str {
        match self {
            SourceError::MissingDocument(_) => "missing-document",
            SourceError::Patch { .. } => "invalid-update",
        }
    }
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::MissingDocument(id) => write!(f, "no source document for id {}", id),
            SourceError::Patch { id, source } => write!(f, "update for {} rejected: {}", id, source),
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourceError::Patch { source, .. } => Some(source),
            SourceError::MissingDocument(_) => None,
        }
    }
}
