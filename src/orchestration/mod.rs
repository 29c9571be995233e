//! # Orchestration Engine
//!
//! Callback-driven execution of multi-step workflows over an external batch
//! service.
//!
//! ## Architecture
//!
//! A workflow is an ordered list of steps; each step is a single job or a
//! group of jobs run in parallel. Steps run strictly in order, and the engine
//! never polls or blocks waiting for them: each step batch carries a success
//! callback whose payload is everything needed to launch the next step. The
//! "loop" over steps is really tail-resumption driven by the batch service,
//! one worker invocation per completed step, on whatever process the service
//! picks.
//!
//! ## Core Components
//!
//! - **OrchestrationBuilder**: imperative accumulator a job's declaration
//!   body drives via `run`/`in_parallel`, serializing to a portable plan
//! - **OrchestrationExecutor**: creates one batch per step, dispatches the
//!   step's jobs into it, and registers itself (by handler name plus a
//!   [`ContinuationState`] payload) as the success continuation
//! - **WorkflowCoordinator**: entry point a concrete [`OrchestrationJob`]
//!   is performed through; also provides the dry-run `workflow_plan`
//!
//! Failure of a step job is not handled here: a step that never fully
//! succeeds never advances, and failure reporting happens through the
//! death/complete callbacks the originating job declares support for.

pub mod builder;
pub mod coordinator;
pub mod errors;
pub mod executor;
pub mod job;
pub mod types;

pub use builder::OrchestrationBuilder;
pub use coordinator::WorkflowCoordinator;
pub use errors::{OrchestrationError, OrchestrationResult};
pub use executor::{OrchestrationExecutor, StepContinuation, CONTINUATION_HANDLER};
pub use job::{CallbackCapabilities, OrchestrationJob};
pub use types::{ContinuationState, JobCall, SerializedJob, SerializedPlan, WorkflowStep};
