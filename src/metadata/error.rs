use thiserror::Error;

/// Reason a metadata record was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("tags must be a sequence")]
    TagsNotSequence,

    #[error("metadata must be a JSON object")]
    NotAnObject,
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Invalid metadata: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Metadata file not found: {0}")]
    NotFound(String),
}
