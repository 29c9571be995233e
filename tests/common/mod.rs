//! Shared harness for orchestration integration tests: an in-memory batch
//! service and in-process runner wired together, with recording jobs and
//! callback handlers for asserting execution order.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

use batchflow_core::batch::{
    BatchError, BatchStatus, CallbackEvent, CallbackHandler, InMemoryBatchService,
};
use batchflow_core::jobs::{DispatchError, InProcessJobRunner, Job, JobRegistry};
use batchflow_core::orchestration::{
    OrchestrationExecutor, StepContinuation, WorkflowCoordinator, CONTINUATION_HANDLER,
};

pub struct Harness {
    pub registry: Arc<JobRegistry>,
    pub batch_service: Arc<InMemoryBatchService>,
    pub runner: Arc<InProcessJobRunner>,
    pub executor: Arc<OrchestrationExecutor>,
    pub coordinator: WorkflowCoordinator,
    /// Chronological record of job performs and callback firings.
    pub log: Arc<Mutex<Vec<String>>>,
}

impl Harness {
    pub fn new() -> Self {
        let registry = Arc::new(JobRegistry::new());
        let batch_service = Arc::new(InMemoryBatchService::new());
        let runner = Arc::new(InProcessJobRunner::new(registry.clone(), batch_service.clone()));
        let executor = Arc::new(OrchestrationExecutor::new(
            batch_service.clone(),
            runner.clone(),
        ));
        batch_service.register_handler(
            CONTINUATION_HANDLER,
            Arc::new(StepContinuation::new(executor.clone())),
        );
        let coordinator = WorkflowCoordinator::new(executor.clone());

        Self {
            registry,
            batch_service,
            runner,
            executor,
            coordinator,
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register a job that records `perform:<name>:<args>` when run.
    pub fn register_recording_job(&self, name: &str) {
        self.registry.register(
            name,
            Arc::new(RecordingJob {
                name: name.to_string(),
                log: self.log.clone(),
            }),
        );
    }

    /// Register a job that always fails.
    pub fn register_failing_job(&self, name: &str) {
        self.registry.register(
            name,
            Arc::new(FailingJob {
                name: name.to_string(),
                log: self.log.clone(),
            }),
        );
    }

    /// Route callbacks registered under `handler_name` into the log as
    /// `callback:<handler_name>:<event>`.
    pub fn register_logging_callback_handler(&self, handler_name: &str) {
        self.batch_service.register_handler(
            handler_name,
            Arc::new(LoggingCallbackHandler {
                name: handler_name.to_string(),
                log: self.log.clone(),
            }),
        );
    }

    pub fn log_entries(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    pub fn position_of(&self, entry: &str) -> usize {
        self.log_entries()
            .iter()
            .position(|e| e == entry)
            .unwrap_or_else(|| panic!("'{entry}' not found in log: {:?}", self.log_entries()))
    }
}

#[derive(Debug)]
struct RecordingJob {
    name: String,
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Job for RecordingJob {
    async fn perform(&self, args: &[Value]) -> Result<(), DispatchError> {
        self.log
            .lock()
            .push(format!("perform:{}:{}", self.name, serde_json::to_string(&args).unwrap()));
        Ok(())
    }
}

#[derive(Debug)]
struct FailingJob {
    name: String,
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Job for FailingJob {
    async fn perform(&self, _args: &[Value]) -> Result<(), DispatchError> {
        self.log.lock().push(format!("perform:{}:failed", self.name));
        Err(DispatchError::JobFailed {
            class_name: self.name.clone(),
            message: "induced failure".to_string(),
        })
    }
}

struct LoggingCallbackHandler {
    name: String,
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl CallbackHandler for LoggingCallbackHandler {
    async fn handle(
        &self,
        event: CallbackEvent,
        _status: &BatchStatus,
        _payload: &Value,
    ) -> Result<(), BatchError> {
        self.log.lock().push(format!("callback:{}:{}", self.name, event));
        Ok(())
    }
}
