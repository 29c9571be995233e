//! # In-Process Job Runner
//!
//! Queue-backed native [`JobRunner`] for embedded execution and tests.
//!
//! `enqueue` only validates and queues; nothing executes until [`drain`] is
//! called. That separation mirrors a real worker fleet closely enough to
//! exercise the orchestration engine's callback chain: every job dispatched
//! while a step batch is open lands in the queue before the first one runs,
//! so a batch can never resolve early just because its first job was quick.
//!
//! [`drain`]: InProcessJobRunner::drain

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};

use super::registry::JobRegistry;
use super::runner::{DispatchError, Job, JobDispatch, JobRunner};
use crate::batch::InMemoryBatchService;

pub struct InProcessJobRunner {
    registry: Arc<JobRegistry>,
    batch_service: Arc<InMemoryBatchService>,
    queue: Mutex<VecDeque<JobDispatch>>,
}

impl InProcessJobRunner {
    pub fn new(registry: Arc<JobRegistry>, batch_service: Arc<InMemoryBatchService>) -> Self {
        Self {
            registry,
            batch_service,
            queue: Mutex::new(VecDeque::new()),
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Run queued jobs until the system is fully idle.
    ///
    /// Performs jobs in dispatch order, reporting each outcome into the batch
    /// service. Batch callbacks fired along the way may enqueue further work
    /// (the next step of an orchestration, typically), which is picked up in
    /// the same drain. Once the queue is empty, empty batches are resolved
    /// and the drain continues if that produced new work.
    ///
    /// A failing job is recorded against its batch and does not stop the
    /// drain; a workflow whose step never succeeds simply never advances.
    /// Returns the number of jobs performed.
    pub async fn drain(&self) -> Result<usize, DispatchError> {
        let mut performed = 0;
        loop {
            let next = self.queue.lock().pop_front();
            match next {
                Some(dispatch) => {
                    performed += 1;
                    self.perform_one(dispatch).await?;
                }
                None => {
                    if !self.batch_service.resolve_idle_empty_batches().await? {
                        break;
                    }
                }
            }
        }
        Ok(performed)
    }

    async fn perform_one(&self, dispatch: JobDispatch) -> Result<(), DispatchError> {
        let job = self.registry.resolve(&dispatch.class_name)?;

        debug!(
            class_name = %dispatch.class_name,
            batch = ?dispatch.batch,
            "performing job"
        );

        match job.perform(&dispatch.args).await {
            Ok(()) => {
                if let Some(batch) = &dispatch.batch {
                    self.batch_service.job_succeeded(batch).await?;
                }
            }
            Err(error) => {
                warn!(
                    class_name = %dispatch.class_name,
                    batch = ?dispatch.batch,
                    error = %error,
                    "job failed"
                );
                if let Some(batch) = &dispatch.batch {
                    self.batch_service.job_failed(batch).await?;
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl JobRunner for InProcessJobRunner {
    async fn enqueue(&self, dispatch: JobDispatch) -> Result<(), DispatchError> {
        // Resolution is checked at dispatch time so a plan naming an
        // unregistered class fails the enqueuing call, not a later worker.
        if !self.registry.contains(&dispatch.class_name) {
            return Err(DispatchError::UnknownJobClass {
                class_name: dispatch.class_name,
            });
        }

        if let Some(batch) = &dispatch.batch {
            self.batch_service.job_added(batch)?;
        }

        debug!(
            class_name = %dispatch.class_name,
            queue = dispatch.options.queue.as_deref().unwrap_or("default"),
            batch = ?dispatch.batch,
            "job enqueued"
        );

        self.queue.lock().push_back(dispatch);
        Ok(())
    }
}
