//! # Workflow Coordinator
//!
//! Entry point that performs an [`OrchestrationJob`]: runs the declaration
//! body against a fresh builder, serializes the result, and hands it to the
//! executor, nested inside the invoking job's enclosing batch when it has
//! one.

use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use super::builder::OrchestrationBuilder;
use super::errors::OrchestrationResult;
use super::executor::OrchestrationExecutor;
use super::job::OrchestrationJob;
use super::types::SerializedPlan;
use crate::batch::BatchId;
use crate::jobs::JobContext;

pub struct WorkflowCoordinator {
    executor: Arc<OrchestrationExecutor>,
}

impl WorkflowCoordinator {
    pub fn new(executor: Arc<OrchestrationExecutor>) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &Arc<OrchestrationExecutor> {
        &self.executor
    }

    /// Perform `job`: declare, serialize, execute.
    ///
    /// When the invoking job runs inside an enclosing batch the layering
    /// becomes parent(orchestration(step...)); otherwise the orchestration
    /// batch is the root. Returns the orchestration batch id.
    pub async fn perform(
        &self,
        job: &dyn OrchestrationJob,
        args: &[Value],
        ctx: &JobContext,
    ) -> OrchestrationResult<BatchId> {
        let mut workflow =
            OrchestrationBuilder::with_child_job_options(job.child_job_options(args));
        job.build_workflow(&mut workflow, args)?;

        let plan = workflow.serialized_workflow().clone();
        let child_job_options = workflow.child_job_options().clone();

        debug!(
            origin = job.class_name(),
            steps = plan.len(),
            nested = ctx.current_batch.is_some(),
            "performing orchestration"
        );

        self.executor
            .execute(args, job, &plan, &child_job_options, ctx.current_batch.as_ref())
            .await
    }

    /// Dry run: the serialized plan `job` would execute for `args`, with
    /// nothing dispatched. Introspection hook for tests and documentation.
    pub fn workflow_plan(
        &self,
        job: &dyn OrchestrationJob,
        args: &[Value],
    ) -> OrchestrationResult<SerializedPlan> {
        let mut workflow =
            OrchestrationBuilder::with_child_job_options(job.child_job_options(args));
        job.build_workflow(&mut workflow, args)?;
        Ok(workflow.serialized_workflow().clone())
    }
}
