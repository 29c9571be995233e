//! # In-Memory Batch Service
//!
//! Native, in-process implementation of the [`BatchService`] contract for
//! embedded execution and the integration test suite.
//!
//! ## Semantics
//!
//! - A batch resolves when its pending job count and pending child-batch
//!   count both reach zero. Resolution fires `complete`, then `success` when
//!   no failures were recorded.
//! - A child batch is counted against its parent at creation and credited
//!   back only after the child's own callbacks have finished. A success
//!   callback that opens the next step batch under the shared parent
//!   therefore keeps the parent unresolved across the step boundary.
//! - `death` fires immediately when a job is reported failed, on the job's
//!   batch and every ancestor batch.
//! - A batch that never receives jobs or children resolves when the driving
//!   runner reaches idle and calls [`InMemoryBatchService::resolve_idle_empty_batches`].
//! - Callback queues are recorded but not acted on: there is only one
//!   in-process "queue" here. Accessors expose the routing for assertions.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::service::{BatchService, CallbackHandler};
use super::types::{BatchError, BatchId, BatchStatus, CallbackEvent, CallbackRegistration};
use async_trait::async_trait;

#[derive(Debug, Default)]
struct BatchRecord {
    parent: Option<BatchId>,
    description: Option<String>,
    callback_queue: Option<String>,
    callbacks: Vec<(CallbackEvent, CallbackRegistration)>,
    pending_jobs: usize,
    pending_children: usize,
    total_jobs: usize,
    failures: usize,
    resolved: bool,
}

impl BatchRecord {
    fn status(&self, batch_id: BatchId) -> BatchStatus {
        BatchStatus {
            batch_id,
            parent_batch_id: self.parent,
            total_jobs: self.total_jobs,
            failures: self.failures,
        }
    }

    fn drained(&self) -> bool {
        self.pending_jobs == 0 && self.pending_children == 0
    }
}

/// In-process batch tree with handler-name callback routing.
pub struct InMemoryBatchService {
    batches: Mutex<HashMap<BatchId, BatchRecord>>,
    handlers: DashMap<String, Arc<dyn CallbackHandler>>,
}

impl InMemoryBatchService {
    pub fn new() -> Self {
        Self {
            batches: Mutex::new(HashMap::new()),
            handlers: DashMap::new(),
        }
    }

    /// Bind a callback handler to the name callbacks are registered under.
    pub fn register_handler(&self, name: impl Into<String>, handler: Arc<dyn CallbackHandler>) {
        self.handlers.insert(name.into(), handler);
    }

    /// Record a job dispatched into `batch`'s scope.
    pub fn job_added(&self, batch: &BatchId) -> Result<(), BatchError> {
        let mut batches = self.batches.lock();
        let record = batches
            .get_mut(batch)
            .ok_or(BatchError::UnknownBatch(*batch))?;
        if record.resolved {
            return Err(BatchError::Backend(format!(
                "batch {batch} already resolved, cannot add jobs"
            )));
        }
        record.pending_jobs += 1;
        record.total_jobs += 1;
        Ok(())
    }

    /// Report a job in `batch` as succeeded, resolving the batch (and any
    /// ancestors it was holding open) if it was the last pending job.
    pub async fn job_succeeded(&self, batch: &BatchId) -> Result<(), BatchError> {
        {
            let mut batches = self.batches.lock();
            let record = batches
                .get_mut(batch)
                .ok_or(BatchError::UnknownBatch(*batch))?;
            record.pending_jobs = record.pending_jobs.saturating_sub(1);
        }
        self.resolve_upward(*batch).await
    }

    /// Report a job in `batch` as dead.
    ///
    /// `death` fires immediately, on the batch itself and on every ancestor:
    /// an orchestration wires its failure reporting onto the top-level batch,
    /// while the job that died lives in a nested step batch. The batch still
    /// completes (without `success`) once drained.
    pub async fn job_failed(&self, batch: &BatchId) -> Result<(), BatchError> {
        let lineage = {
            let mut batches = self.batches.lock();
            let record = batches
                .get_mut(batch)
                .ok_or(BatchError::UnknownBatch(*batch))?;
            record.failures += 1;
            record.pending_jobs = record.pending_jobs.saturating_sub(1);

            let mut lineage = Vec::new();
            let mut current = Some(*batch);
            while let Some(batch_id) = current {
                let record = batches
                    .get(&batch_id)
                    .ok_or(BatchError::UnknownBatch(batch_id))?;
                lineage.push((record.status(batch_id), record.callbacks.clone()));
                current = record.parent;
            }
            lineage
        };

        for (status, callbacks) in &lineage {
            self.fire(status, CallbackEvent::Death, callbacks).await?;
        }
        self.resolve_upward(*batch).await
    }

    /// Resolve batches that never received a job or child batch.
    ///
    /// The question of what an empty batch does is the service's to answer,
    /// not the orchestration core's; this implementation answers it by firing
    /// `complete`/`success` once the driving runner has gone idle. Returns
    /// whether anything resolved, so the runner can re-enter its drain loop
    /// for work the callbacks enqueued.
    pub async fn resolve_idle_empty_batches(&self) -> Result<bool, BatchError> {
        let idle_empty: Vec<BatchId> = {
            let batches = self.batches.lock();
            batches
                .iter()
                .filter(|(_, record)| !record.resolved && record.total_jobs == 0 && record.drained())
                .map(|(id, _)| *id)
                .collect()
        };

        let mut resolved_any = false;
        for batch_id in idle_empty {
            // Re-checked inside resolve_upward; an earlier iteration may have
            // resolved this batch as an ancestor.
            let before = self.is_resolved(&batch_id);
            self.resolve_upward(batch_id).await?;
            if !before && self.is_resolved(&batch_id) {
                resolved_any = true;
            }
        }
        Ok(resolved_any)
    }

    pub fn is_resolved(&self, batch: &BatchId) -> bool {
        self.batches
            .lock()
            .get(batch)
            .map(|record| record.resolved)
            .unwrap_or(false)
    }

    pub fn status_of(&self, batch: &BatchId) -> Option<BatchStatus> {
        self.batches.lock().get(batch).map(|r| r.status(*batch))
    }

    pub fn description_of(&self, batch: &BatchId) -> Option<String> {
        self.batches.lock().get(batch).and_then(|r| r.description.clone())
    }

    pub fn callback_queue_of(&self, batch: &BatchId) -> Option<String> {
        self.batches
            .lock()
            .get(batch)
            .and_then(|r| r.callback_queue.clone())
    }

    /// Registered callbacks for a batch as `(event, handler name)` pairs.
    pub fn registered_callbacks(&self, batch: &BatchId) -> Vec<(CallbackEvent, String)> {
        self.batches
            .lock()
            .get(batch)
            .map(|record| {
                record
                    .callbacks
                    .iter()
                    .map(|(event, registration)| (*event, registration.handler.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Walk up from `start`, resolving every batch whose pending counts have
    /// drained. Callbacks for a batch fire before its parent is credited, so
    /// a continuation handler gets the chance to open the next step batch
    /// under the parent before the parent can possibly resolve.
    async fn resolve_upward(&self, start: BatchId) -> Result<(), BatchError> {
        let mut current = Some(start);
        while let Some(batch_id) = current {
            let (status, callbacks, parent) = {
                let mut batches = self.batches.lock();
                let record = batches
                    .get_mut(&batch_id)
                    .ok_or(BatchError::UnknownBatch(batch_id))?;
                if record.resolved || !record.drained() {
                    return Ok(());
                }
                record.resolved = true;
                (record.status(batch_id), record.callbacks.clone(), record.parent)
            };

            debug!(
                batch_id = %batch_id,
                total_jobs = status.total_jobs,
                failures = status.failures,
                "batch drained, firing callbacks"
            );

            self.fire(&status, CallbackEvent::Complete, &callbacks).await?;
            if status.is_success() {
                self.fire(&status, CallbackEvent::Success, &callbacks).await?;
            }

            current = match parent {
                Some(parent_id) => {
                    let mut batches = self.batches.lock();
                    if let Some(record) = batches.get_mut(&parent_id) {
                        record.pending_children = record.pending_children.saturating_sub(1);
                        if !status.is_success() {
                            record.failures += 1;
                        }
                    }
                    Some(parent_id)
                }
                None => None,
            };
        }
        Ok(())
    }

    async fn fire(
        &self,
        status: &BatchStatus,
        event: CallbackEvent,
        callbacks: &[(CallbackEvent, CallbackRegistration)],
    ) -> Result<(), BatchError> {
        for (_, registration) in callbacks.iter().filter(|(e, _)| *e == event) {
            let handler = self
                .handlers
                .get(registration.handler.as_str())
                .map(|entry| Arc::clone(entry.value()))
                .ok_or_else(|| BatchError::UnknownCallbackHandler(registration.handler.clone()))?;
            handler.handle(event, status, &registration.payload).await?;
        }
        Ok(())
    }
}

impl Default for InMemoryBatchService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BatchService for InMemoryBatchService {
    async fn create_batch(&self, parent: Option<&BatchId>) -> Result<BatchId, BatchError> {
        let batch_id = BatchId::new();
        let mut batches = self.batches.lock();
        if let Some(parent_id) = parent {
            let parent_record = batches
                .get_mut(parent_id)
                .ok_or(BatchError::UnknownBatch(*parent_id))?;
            parent_record.pending_children += 1;
        }
        batches.insert(
            batch_id,
            BatchRecord {
                parent: parent.copied(),
                ..BatchRecord::default()
            },
        );
        Ok(batch_id)
    }

    async fn set_description(
        &self,
        batch: &BatchId,
        description: &str,
    ) -> Result<(), BatchError> {
        let mut batches = self.batches.lock();
        let record = batches
            .get_mut(batch)
            .ok_or(BatchError::UnknownBatch(*batch))?;
        record.description = Some(description.to_string());
        Ok(())
    }

    async fn on_event(
        &self,
        batch: &BatchId,
        event: CallbackEvent,
        registration: CallbackRegistration,
    ) -> Result<(), BatchError> {
        let mut batches = self.batches.lock();
        let record = batches
            .get_mut(batch)
            .ok_or(BatchError::UnknownBatch(*batch))?;
        if record.resolved {
            warn!(batch_id = %batch, event = %event, "callback registered on resolved batch, will never fire");
        }
        record.callbacks.push((event, registration));
        Ok(())
    }

    async fn set_callback_queue(&self, batch: &BatchId, queue: &str) -> Result<(), BatchError> {
        let mut batches = self.batches.lock();
        let record = batches
            .get_mut(batch)
            .ok_or(BatchError::UnknownBatch(*batch))?;
        record.callback_queue = Some(queue.to_string());
        Ok(())
    }

    async fn parent_of(&self, batch: &BatchId) -> Result<Option<BatchId>, BatchError> {
        let batches = self.batches.lock();
        batches
            .get(batch)
            .map(|record| record.parent)
            .ok_or(BatchError::UnknownBatch(*batch))
    }
}
