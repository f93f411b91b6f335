use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SinkError {
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SinkError>;

impl From<std::io::Error> for SinkError {
    fn from(e: std::io::Error) -> Self {
        SinkError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for SinkError {
    fn from(e: serde_json::Error) -> Self {
        SinkError::Json(e.to_string())
    }
}

/// Outcome of a failed `process_batch` call.
///
/// The caller branches on the tag: a `Retriable` failure means redelivering the
/// identical batch is safe and expected to eventually succeed. `NonRetriable`
/// means the input itself is bad and redelivery would fail the same way.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error("retriable failure: {0}")]
    Retriable(#[source] SinkError),

    #[error("non-retriable failure: {0}")]
    NonRetriable(#[source] SinkError),
}

impl DispatchError {
    pub fn is_retriable(&self) -> bool {
        matches!(self, DispatchError::Retriable(_))
    }

    pub fn inner(&self) -> &SinkError {
        match self {
            DispatchError::Retriable(e) | DispatchError::NonRetriable(e) => e,
        }
    }

    pub fn into_inner(self) -> SinkError {
        match self {
            DispatchError::Retriable(e) | DispatchError::NonRetriable(e) => e,
        }
    }
}
