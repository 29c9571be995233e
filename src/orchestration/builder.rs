//! # Workflow Builder
//!
//! Imperative accumulator behind a workflow job's declaration body. `run`
//! records a step; `in_parallel` groups the `run` calls made inside its body
//! into a single step. Serialization to the wire plan happens once and is
//! cached; the plan a continuation carries can never drift from what the
//! declaration produced.

use serde_json::Value;
use std::sync::OnceLock;

use super::errors::{OrchestrationError, OrchestrationResult};
use super::types::{JobCall, SerializedJob, SerializedPlan, WorkflowStep};
use crate::jobs::JobOptions;

#[derive(Debug)]
pub struct OrchestrationBuilder {
    serial: Vec<WorkflowStep>,
    /// Open parallel scope, if any. A single optional slot: the step model is
    /// flat, so an already-open scope makes a second `in_parallel` an error.
    parallel: Option<Vec<JobCall>>,
    child_job_options: JobOptions,
    serialized: OnceLock<SerializedPlan>,
}

impl OrchestrationBuilder {
    pub fn new() -> Self {
        Self::with_child_job_options(JobOptions::default())
    }

    /// Build with the option set applied to every child job this workflow
    /// enqueues, fixed for the lifetime of the instance.
    pub fn with_child_job_options(child_job_options: JobOptions) -> Self {
        Self {
            serial: Vec::new(),
            parallel: None,
            child_job_options,
            serialized: OnceLock::new(),
        }
    }

    pub fn child_job_options(&self) -> &JobOptions {
        &self.child_job_options
    }

    /// Record a job invocation as the next step, or as a member of the open
    /// parallel group when called inside an `in_parallel` body.
    ///
    /// The class name is not validated here; it only has to be resolvable by
    /// the job runner at dispatch time.
    pub fn run(&mut self, job_class: impl Into<String>, args: Vec<Value>) -> &mut Self {
        let call = JobCall::new(job_class, args);
        match &mut self.parallel {
            Some(group) => group.push(call),
            None => self.serial.push(WorkflowStep::Single(call)),
        }
        self
    }

    /// Group the `run` calls made inside `body` into one parallel step.
    ///
    /// The group becomes a step only if `body` recorded at least one job; an
    /// empty group is suppressed rather than serialized as a no-op step. The
    /// scope is torn down unconditionally, including when `body` errors, so
    /// a later top-level `run` can never land inside a finished group.
    pub fn in_parallel<F>(&mut self, body: F) -> OrchestrationResult<&mut Self>
    where
        F: FnOnce(&mut Self) -> OrchestrationResult<()>,
    {
        if self.parallel.is_some() {
            return Err(OrchestrationError::NestedParallel);
        }

        self.parallel = Some(Vec::new());
        let outcome = body(self);
        let group = self.parallel.take();
        outcome?;

        if let Some(group) = group {
            if !group.is_empty() {
                self.serial.push(WorkflowStep::Parallel(group));
            }
        }
        Ok(self)
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.serial.len()
    }

    pub fn is_empty(&self) -> bool {
        self.serial.is_empty()
    }

    /// The wire form of the recorded workflow, computed once and cached.
    ///
    /// A single step maps to a one-element list, a parallel group to a
    /// multi-element list; every element carries the fixed child job options.
    pub fn serialized_workflow(&self) -> &SerializedPlan {
        self.serialized.get_or_init(|| {
            let steps = self
                .serial
                .iter()
                .map(|step| match step {
                    WorkflowStep::Single(call) => vec![self.serialize_call(call)],
                    WorkflowStep::Parallel(group) => {
                        group.iter().map(|call| self.serialize_call(call)).collect()
                    }
                })
                .collect();
            SerializedPlan(steps)
        })
    }

    fn serialize_call(&self, call: &JobCall) -> SerializedJob {
        SerializedJob {
            class_name: call.class_name.clone(),
            options: self.child_job_options.clone(),
            args: call.args.clone(),
        }
    }
}

impl Default for OrchestrationBuilder {
    fn default() -> Self {
        Self::new()
    }
}
