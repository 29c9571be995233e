#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Batchflow Core
//!
//! Callback-driven workflow orchestration core over batch-capable job queues.
//!
//! ## Overview
//!
//! Batchflow lets a single logical job declare a multi-step workflow (steps
//! run serially, jobs within a step run in parallel) and executes it to
//! completion using nothing but the batch service's success callbacks as the
//! continuation mechanism. There is no polling loop and no coordinator
//! thread: each completed step batch resumes the engine exactly once, on
//! whatever worker the batch service picks, with all state carried in a
//! plain-data continuation record.
//!
//! The batch primitive itself (persistence, atomic job counting, callback
//! delivery) and the job queue (enqueue by class name, retries, delivery
//! guarantees) are external collaborators, spoken to through the
//! [`batch::BatchService`] and [`jobs::JobRunner`] traits. In-process
//! implementations of both ship in this crate for embedded use and tests.
//!
//! ## Module Organization
//!
//! - [`orchestration`] - Workflow building, serialization, and the
//!   step-execution state machine
//! - [`batch`] - Batch service interface and the in-memory implementation
//! - [`jobs`] - Job runner interface, registry, and the in-process runner
//! - [`events`] - Lifecycle event publishing
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use serde_json::{json, Value};
//! use batchflow_core::batch::InMemoryBatchService;
//! use batchflow_core::jobs::{InProcessJobRunner, JobContext, JobRegistry};
//! use batchflow_core::orchestration::{
//!     OrchestrationBuilder, OrchestrationExecutor, OrchestrationJob, OrchestrationResult,
//!     WorkflowCoordinator,
//! };
//!
//! struct NightlySync;
//!
//! #[async_trait]
//! impl OrchestrationJob for NightlySync {
//!     fn class_name(&self) -> &str {
//!         "NightlySync"
//!     }
//!
//!     fn build_workflow(
//!         &self,
//!         workflow: &mut OrchestrationBuilder,
//!         _args: &[Value],
//!     ) -> OrchestrationResult<()> {
//!         workflow.run("FetchAccounts", vec![]);
//!         workflow.in_parallel(|flow| {
//!             flow.run("SyncOrders", vec![json!("eu")]);
//!             flow.run("SyncOrders", vec![json!("us")]);
//!             Ok(())
//!         })?;
//!         workflow.run("PublishReport", vec![]);
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(JobRegistry::new());
//! let batch_service = Arc::new(InMemoryBatchService::new());
//! let runner = Arc::new(InProcessJobRunner::new(registry.clone(), batch_service.clone()));
//! let executor = Arc::new(OrchestrationExecutor::new(batch_service, runner.clone()));
//! let coordinator = WorkflowCoordinator::new(executor);
//!
//! coordinator.perform(&NightlySync, &[], &JobContext::detached()).await?;
//! runner.drain().await?;
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod events;
pub mod jobs;
pub mod logging;
pub mod orchestration;

pub use config::BatchflowConfig;
pub use error::{BatchflowError, Result};
pub use orchestration::{
    ContinuationState, OrchestrationBuilder, OrchestrationExecutor, OrchestrationJob,
    SerializedPlan, StepContinuation, WorkflowCoordinator, CONTINUATION_HANDLER,
};
