use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum BatchflowError {
    WorkflowError(String),
    BatchServiceError(String),
    DispatchError(String),
    SerializationError(String),
    ConfigurationError(String),
}

impl fmt::Display for BatchflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchflowError::WorkflowError(msg) => write!(f, "Workflow error: {msg}"),
            BatchflowError::BatchServiceError(msg) => write!(f, "Batch service error: {msg}"),
            BatchflowError::DispatchError(msg) => write!(f, "Dispatch error: {msg}"),
            BatchflowError::SerializationError(msg) => write!(f, "Serialization error: {msg}"),
            BatchflowError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for BatchflowError {}

impl From<serde_json::Error> for BatchflowError {
    fn from(err: serde_json::Error) -> Self {
        BatchflowError::SerializationError(err.to_string())
    }
}

impl From<crate::batch::BatchError> for BatchflowError {
    fn from(err: crate::batch::BatchError) -> Self {
        BatchflowError::BatchServiceError(err.to_string())
    }
}

impl From<crate::jobs::DispatchError> for BatchflowError {
    fn from(err: crate::jobs::DispatchError) -> Self {
        BatchflowError::DispatchError(err.to_string())
    }
}

impl From<crate::orchestration::OrchestrationError> for BatchflowError {
    fn from(err: crate::orchestration::OrchestrationError) -> Self {
        BatchflowError::WorkflowError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BatchflowError>;
