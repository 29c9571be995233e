//! # Orchestration Job
//!
//! The trait a concrete workflow-defining job implements. The declaration
//! body drives the builder; everything else is optional capabilities the
//! executor checks before wiring batch callbacks.

use async_trait::async_trait;
use serde_json::Value;

use super::builder::OrchestrationBuilder;
use super::errors::OrchestrationResult;
use crate::batch::{BatchId, BatchService};
use crate::jobs::JobOptions;

/// Which batch lifecycle callbacks a job wants wired onto its orchestration
/// batch. Explicit capability flags replace the original systems' habit of
/// probing for handler methods at runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallbackCapabilities {
    pub on_death: bool,
    pub on_complete: bool,
    pub on_success: bool,
}

impl CallbackCapabilities {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            on_death: true,
            on_complete: true,
            on_success: true,
        }
    }

    pub fn any(&self) -> bool {
        self.on_death || self.on_complete || self.on_success
    }
}

/// A job whose body declares a multi-step workflow instead of doing work
/// directly.
///
/// Implementors provide the declaration body and, optionally, callback
/// capabilities. Handlers for the declared callbacks are registered with the
/// batch service under this job's `class_name`; declaring a capability
/// without registering a matching handler is a deployment error surfaced by
/// the batch service at fire time.
#[async_trait]
pub trait OrchestrationJob: Send + Sync {
    /// Registered class name, used for callback handler binding, batch
    /// descriptions, and the continuation record.
    fn class_name(&self) -> &str;

    /// The declaration body: record steps on `workflow` via
    /// [`OrchestrationBuilder::run`] and [`OrchestrationBuilder::in_parallel`].
    /// Nothing is dispatched while this runs.
    fn build_workflow(
        &self,
        workflow: &mut OrchestrationBuilder,
        args: &[Value],
    ) -> OrchestrationResult<()>;

    /// Options applied to every child job of this workflow, derived from the
    /// invocation arguments. Defaults to empty.
    fn child_job_options(&self, _args: &[Value]) -> JobOptions {
        JobOptions::default()
    }

    /// Which lifecycle callbacks to wire onto the orchestration batch.
    fn callback_capabilities(&self) -> CallbackCapabilities {
        CallbackCapabilities::none()
    }

    /// Whether [`register_custom_callbacks`] should be invoked.
    ///
    /// [`register_custom_callbacks`]: OrchestrationJob::register_custom_callbacks
    fn has_custom_callbacks(&self) -> bool {
        false
    }

    /// Hook for registering arbitrary additional callbacks on the
    /// orchestration batch. Invoked exactly once per execution, after the
    /// standard callbacks are wired and before any step is dispatched.
    async fn register_custom_callbacks(
        &self,
        _batch: &BatchId,
        _service: &dyn BatchService,
    ) -> OrchestrationResult<()> {
        Ok(())
    }
}
