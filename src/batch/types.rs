use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Opaque identifier for a batch managed by the external batch service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(Uuid);

impl BatchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Snapshot of a batch handed to callback handlers when an event fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchStatus {
    pub batch_id: BatchId,
    /// The batch this one was created under, if any. Continuation handlers
    /// use this to open the next step batch at the same nesting depth.
    pub parent_batch_id: Option<BatchId>,
    pub total_jobs: usize,
    pub failures: usize,
}

impl BatchStatus {
    pub fn is_success(&self) -> bool {
        self.failures == 0
    }
}

/// Lifecycle events a batch can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackEvent {
    /// A job in the batch exhausted its retries.
    Death,
    /// Every job has run, regardless of outcome.
    Complete,
    /// Every job succeeded.
    Success,
}

impl fmt::Display for CallbackEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackEvent::Death => write!(f, "death"),
            CallbackEvent::Complete => write!(f, "complete"),
            CallbackEvent::Success => write!(f, "success"),
        }
    }
}

/// A callback binding persisted by the batch service: the name of the handler
/// to invoke and the plain-data payload to invoke it with.
///
/// The payload must round-trip through the service's persistence, so it is
/// restricted to JSON-representable data. Live references never survive the
/// trip to whichever worker fires the callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackRegistration {
    pub handler: String,
    pub payload: Value,
}

impl CallbackRegistration {
    pub fn new(handler: impl Into<String>, payload: Value) -> Self {
        Self {
            handler: handler.into(),
            payload,
        }
    }
}

/// Errors surfaced by a batch service implementation.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Unknown batch: {0}")]
    UnknownBatch(BatchId),

    #[error("No handler registered for callback '{0}'")]
    UnknownCallbackHandler(String),

    #[error("Callback handler failed: {0}")]
    CallbackFailed(String),

    #[error("Batch service backend error: {0}")]
    Backend(String),
}
