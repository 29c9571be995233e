use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::batch::{BatchError, BatchId};

/// Per-job execution options.
///
/// This is both the `ChildJobOptions` a workflow fixes once for all of its
/// children and the option set handed to the runner on every dispatch. The
/// `queue` key is understood by this crate (it also routes batch callback
/// delivery); everything else is carried opaquely for the runner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl JobOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = Some(queue.into());
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_none() && self.extra.is_empty()
    }
}

/// A fire-and-forget dispatch request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDispatch {
    pub class_name: String,
    pub args: Vec<Value>,
    pub options: JobOptions,
    /// Batch this job is counted against, if any.
    pub batch: Option<BatchId>,
}

impl JobDispatch {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            args: Vec::new(),
            options: JobOptions::default(),
            batch: None,
        }
    }

    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    pub fn with_options(mut self, options: JobOptions) -> Self {
        self.options = options;
        self
    }

    pub fn in_batch(mut self, batch: BatchId) -> Self {
        self.batch = Some(batch);
        self
    }
}

/// Execution context handed to a job when it is performed.
///
/// Carries the one piece of ambient state the original queue systems expose
/// implicitly: whether this invocation is running inside a batch.
#[derive(Debug, Clone, Default)]
pub struct JobContext {
    pub current_batch: Option<BatchId>,
}

impl JobContext {
    /// Context for a job running outside any batch.
    pub fn detached() -> Self {
        Self { current_batch: None }
    }

    /// Context for a job running inside `batch`.
    pub fn within_batch(batch: BatchId) -> Self {
        Self {
            current_batch: Some(batch),
        }
    }
}

/// Errors that can occur during job dispatch and execution.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The recorded class name has no registered job. A workflow plan naming
    /// an unresolvable class is a deployment configuration error, never
    /// retried by this crate.
    #[error("No job registered under class name '{class_name}'")]
    UnknownJobClass { class_name: String },

    #[error("Job '{class_name}' failed: {message}")]
    JobFailed { class_name: String, message: String },

    #[error("Batch accounting error: {0}")]
    Batch(#[from] BatchError),

    #[error("Job runner backend error: {0}")]
    Backend(String),
}

/// A performable unit registered with the runner under a class name.
#[async_trait]
pub trait Job: Send + Sync + std::fmt::Debug {
    async fn perform(&self, args: &[Value]) -> Result<(), DispatchError>;
}

/// Interface to the external job runner.
///
/// `enqueue` is fire-and-forget: it returns once the dispatch is accepted,
/// never waiting on execution. Dispatch failures propagate to the caller
/// synchronously; what happens to a job after acceptance is the runner's
/// at-least-once delivery contract.
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn enqueue(&self, dispatch: JobDispatch) -> Result<(), DispatchError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_options_serialize_to_empty_map() {
        let options = JobOptions::new();
        assert!(options.is_empty());
        assert_eq!(serde_json::to_value(&options).unwrap(), json!({}));
    }

    #[test]
    fn test_options_round_trip() {
        let options = JobOptions::new()
            .with_queue("critical")
            .with_option("tags", json!(["billing"]));

        let value = serde_json::to_value(&options).unwrap();
        assert_eq!(value, json!({"queue": "critical", "tags": ["billing"]}));

        let restored: JobOptions = serde_json::from_value(value).unwrap();
        assert_eq!(restored, options);
    }

    #[test]
    fn test_dispatch_builder() {
        let batch = BatchId::new();
        let dispatch = JobDispatch::new("OrderSync")
            .with_args(vec![json!(42)])
            .with_options(JobOptions::new().with_queue("low"))
            .in_batch(batch);

        assert_eq!(dispatch.class_name, "OrderSync");
        assert_eq!(dispatch.args, vec![json!(42)]);
        assert_eq!(dispatch.options.queue.as_deref(), Some("low"));
        assert_eq!(dispatch.batch, Some(batch));
    }
}
