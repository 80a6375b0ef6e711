use thiserror::Error;

/// Result type alias for address-merge operations
pub type Result<T, E = AddressMergeError> = std::result::Result<T, E>;

/// Errors that can occur while serving the skill endpoint
#[derive(Error, Debug)]
pub enum AddressMergeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Response serialization error: {0}")]
    ResponseSerializationError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] crate::config::ValidationError),
}

/// Failures that reject the whole request before any record is looked at.
///
/// The `Display` text is what goes out in the `{"error": ...}` body.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("Invalid request body")]
    MalformedRequest,

    #[error("Request body is empty")]
    EmptyRequest,
}

/// Failure of a single record. Sibling records are unaffected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("record must be an object, found {0}")]
    NotAnObject(&'static str),

    #[error("record is missing required field 'recordId'")]
    MissingRecordId,

    #[error("field 'recordId' must be a string, found {0}")]
    InvalidRecordId(&'static str),

    #[error("field 'data' must be an object, found {0}")]
    InvalidData(&'static str),

    #[error("field '{field}' must be a string, found {found}")]
    InvalidField {
        field: &'static str,
        found: &'static str,
    },
}
