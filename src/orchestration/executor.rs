//! # Orchestration Executor
//!
//! The recursive batch-callback state machine. `execute` opens the
//! orchestration batch and launches step 0; each `run_step` opens one step
//! batch, dispatches that step's jobs into it, and registers a continuation
//! for the step after it; `on_success` is where the batch service re-enters
//! the engine when a step batch fully succeeds.
//!
//! The executor holds no state between invocations. Everything a resumption
//! needs travels in the [`ContinuationState`] payload, so any worker process
//! with the same wiring can pick up the next step.

use serde_json::json;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use super::errors::{OrchestrationError, OrchestrationResult};
use super::job::OrchestrationJob;
use super::types::{ContinuationState, SerializedJob, SerializedPlan};
use crate::batch::{
    BatchError, BatchId, BatchService, BatchStatus, CallbackEvent, CallbackHandler,
    CallbackRegistration,
};
use crate::config::BatchflowConfig;
use crate::events::{names, EventPublisher};
use crate::jobs::{JobDispatch, JobOptions, JobRunner};

use async_trait::async_trait;

/// Handler name the executor registers its step continuations under. The
/// batch service's callback routing must bind this name to a
/// [`StepContinuation`] for workflows to advance.
pub const CONTINUATION_HANDLER: &str = "OrchestrationExecutor";

pub struct OrchestrationExecutor {
    batch_service: Arc<dyn BatchService>,
    job_runner: Arc<dyn JobRunner>,
    events: EventPublisher,
    config: BatchflowConfig,
}

impl OrchestrationExecutor {
    pub fn new(batch_service: Arc<dyn BatchService>, job_runner: Arc<dyn JobRunner>) -> Self {
        Self::with_config(batch_service, job_runner, BatchflowConfig::default())
    }

    pub fn with_config(
        batch_service: Arc<dyn BatchService>,
        job_runner: Arc<dyn JobRunner>,
        config: BatchflowConfig,
    ) -> Self {
        let events = EventPublisher::with_capacity(config.event_buffer_size);
        Self {
            batch_service,
            job_runner,
            events,
            config,
        }
    }

    /// Lifecycle event publisher, for subscribers outside the dispatch path.
    pub fn events(&self) -> &EventPublisher {
        &self.events
    }

    /// Launch a serialized workflow.
    ///
    /// Creates the orchestration batch (under `parent` when the invoking job
    /// is itself running inside a batch), wires the originating job's
    /// declared callbacks and custom-callback hook, routes callback delivery
    /// to the child-job queue when one is configured, and kicks off step 0.
    ///
    /// An empty plan still creates the batch with its callbacks; whether and
    /// when those fire is the batch service's empty-batch contract.
    pub async fn execute(
        &self,
        args: &[Value],
        job: &dyn OrchestrationJob,
        plan: &SerializedPlan,
        child_job_options: &JobOptions,
        parent: Option<&BatchId>,
    ) -> OrchestrationResult<BatchId> {
        let orchestration_batch = self.batch_service.create_batch(parent).await?;

        let description = format!(
            "{} {}. Params: {}",
            self.config.description_tag,
            job.class_name(),
            serde_json::to_string(args)?
        );
        self.batch_service
            .set_description(&orchestration_batch, &description)
            .await?;

        self.auto_define_callbacks(&orchestration_batch, args, job).await?;

        if let Some(queue) = &child_job_options.queue {
            self.batch_service
                .set_callback_queue(&orchestration_batch, queue)
                .await?;
        }

        info!(
            batch_id = %orchestration_batch,
            origin = job.class_name(),
            steps = plan.len(),
            nested = parent.is_some(),
            "orchestration batch created"
        );
        self.events.publish(
            names::ORCHESTRATION_STARTED,
            json!({
                "batch_id": orchestration_batch.to_string(),
                "origin": job.class_name(),
                "steps": plan.len(),
            }),
        );

        if !plan.is_empty() {
            self.run_step(plan, 0, job.class_name(), child_job_options, &orchestration_batch)
                .await?;
        }

        Ok(orchestration_batch)
    }

    /// Launch the step at `step_index` inside a fresh step batch under
    /// `parent`.
    ///
    /// Registers the continuation for the following step, except at the
    /// last index: there the chain simply ends and the orchestration batch's
    /// own callbacks take over reporting.
    pub async fn run_step(
        &self,
        plan: &SerializedPlan,
        step_index: usize,
        origin_job_class_name: &str,
        child_job_options: &JobOptions,
        parent: &BatchId,
    ) -> OrchestrationResult<BatchId> {
        let jobs = plan
            .step(step_index)
            .ok_or(OrchestrationError::StepOutOfRange {
                index: step_index,
                len: plan.len(),
            })?;
        // The builder suppresses empty parallel groups instead of serializing
        // them, so this only trips on a plan that never came from a builder.
        if jobs.is_empty() {
            return Err(OrchestrationError::EmptyStep { index: step_index });
        }

        let next_step = step_index + 1;
        let step_batch = self.batch_service.create_batch(Some(parent)).await?;

        self.batch_service
            .set_description(
                &step_batch,
                &self.step_batch_description(jobs, next_step, origin_job_class_name),
            )
            .await?;

        if next_step < plan.len() {
            let state = ContinuationState {
                plan: plan.clone(),
                next_step_index: next_step,
                origin_job_class_name: origin_job_class_name.to_string(),
                child_job_options: child_job_options.clone(),
            };
            self.batch_service
                .on_event(
                    &step_batch,
                    CallbackEvent::Success,
                    CallbackRegistration::new(CONTINUATION_HANDLER, serde_json::to_value(&state)?),
                )
                .await?;
        }

        if let Some(queue) = &child_job_options.queue {
            self.batch_service
                .set_callback_queue(&step_batch, queue)
                .await?;
        }

        let dispatches = jobs.iter().map(|job| {
            self.job_runner.enqueue(
                JobDispatch::new(&job.class_name)
                    .with_args(job.args.clone())
                    .with_options(job.options.clone())
                    .in_batch(step_batch),
            )
        });
        futures::future::try_join_all(dispatches).await?;

        debug!(
            batch_id = %step_batch,
            step_index,
            origin = origin_job_class_name,
            jobs = jobs.len(),
            "step batch dispatched"
        );
        self.events.publish(
            names::STEP_ENQUEUED,
            json!({
                "batch_id": step_batch.to_string(),
                "step_index": step_index,
                "origin": origin_job_class_name,
                "jobs": jobs.len(),
            }),
        );

        Ok(step_batch)
    }

    /// Success-callback entry point: a step batch fully succeeded.
    ///
    /// Opens the next step batch under the completed batch's *parent*, so
    /// successive step batches nest at the same depth instead of burrowing
    /// one level deeper per step. Terminal states are a no-op; an external
    /// service may redeliver a persisted callback, and a finished workflow
    /// must absorb that silently.
    pub async fn on_success(
        &self,
        status: &BatchStatus,
        state: &ContinuationState,
    ) -> OrchestrationResult<()> {
        if state.is_terminal() {
            debug!(
                batch_id = %status.batch_id,
                origin = %state.origin_job_class_name,
                "workflow complete, no continuation"
            );
            return Ok(());
        }

        let parent = status
            .parent_batch_id
            .ok_or(OrchestrationError::MissingParentScope {
                batch_id: status.batch_id,
            })?;

        self.events.publish(
            names::STEP_COMPLETED,
            json!({
                "batch_id": status.batch_id.to_string(),
                "completed_step_index": state.next_step_index - 1,
                "origin": state.origin_job_class_name,
            }),
        );

        self.run_step(
            &state.plan,
            state.next_step_index,
            &state.origin_job_class_name,
            &state.child_job_options,
            &parent,
        )
        .await?;
        Ok(())
    }

    /// Wire the callbacks the originating job declares support for, then its
    /// custom-callback hook. Handlers are bound by the job's class name; the
    /// payload carries the original invocation arguments.
    async fn auto_define_callbacks(
        &self,
        batch: &BatchId,
        args: &[Value],
        job: &dyn OrchestrationJob,
    ) -> OrchestrationResult<()> {
        let capabilities = job.callback_capabilities();
        let payload = json!({ "args": args });

        if capabilities.on_death {
            self.batch_service
                .on_event(
                    batch,
                    CallbackEvent::Death,
                    CallbackRegistration::new(job.class_name(), payload.clone()),
                )
                .await?;
        }
        if capabilities.on_complete {
            self.batch_service
                .on_event(
                    batch,
                    CallbackEvent::Complete,
                    CallbackRegistration::new(job.class_name(), payload.clone()),
                )
                .await?;
        }
        if capabilities.on_success {
            self.batch_service
                .on_event(
                    batch,
                    CallbackEvent::Success,
                    CallbackRegistration::new(job.class_name(), payload.clone()),
                )
                .await?;
        }

        if job.has_custom_callbacks() {
            job.register_custom_callbacks(batch, self.batch_service.as_ref())
                .await?;
        }
        Ok(())
    }

    fn step_batch_description(
        &self,
        jobs: &[SerializedJob],
        step_number: usize,
        origin_job_class_name: &str,
    ) -> String {
        let mut description = format!(
            "{} step {} in {}. ",
            self.config.description_tag, step_number, origin_job_class_name
        );
        if jobs.len() > 1 {
            description.push_str(&format!("Running {} jobs in parallel.", jobs.len()));
        } else {
            description.push_str(&format!("Running {}.", jobs[0].class_name));
        }
        description
    }
}

/// Bridges the batch service's named-handler callback dispatch to
/// [`OrchestrationExecutor::on_success`]. Register one under
/// [`CONTINUATION_HANDLER`] in whatever routes callbacks for the deployment.
pub struct StepContinuation {
    executor: Arc<OrchestrationExecutor>,
}

impl StepContinuation {
    pub fn new(executor: Arc<OrchestrationExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl CallbackHandler for StepContinuation {
    async fn handle(
        &self,
        event: CallbackEvent,
        status: &BatchStatus,
        payload: &Value,
    ) -> Result<(), BatchError> {
        if event != CallbackEvent::Success {
            return Ok(());
        }

        let state: ContinuationState = serde_json::from_value(payload.clone())
            .map_err(|e| BatchError::CallbackFailed(format!("invalid continuation payload: {e}")))?;

        self.executor
            .on_success(status, &state)
            .await
            .map_err(|e| BatchError::CallbackFailed(e.to_string()))
    }
}
