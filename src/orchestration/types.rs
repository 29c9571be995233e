//! # Orchestration Types
//!
//! Shared data model for declared workflows, their wire form, and the
//! continuation record that carries a workflow across worker invocations.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::jobs::JobOptions;

/// A recorded job invocation: the class name it will be resolved by at
/// dispatch time, plus its captured positional arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobCall {
    pub class_name: String,
    pub args: Vec<Value>,
}

impl JobCall {
    pub fn new(class_name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            class_name: class_name.into(),
            args,
        }
    }
}

/// One position in the declared workflow order.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowStep {
    Single(JobCall),
    /// A non-empty group dispatched together; the step completes only when
    /// every member has succeeded. The builder never records an empty group.
    Parallel(Vec<JobCall>),
}

/// Wire form of one job within a serialized step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedJob {
    pub class_name: String,
    pub options: JobOptions,
    pub args: Vec<Value>,
}

/// The portable, restartable plan: an ordered sequence of steps, each a
/// non-empty list of jobs. Produced once per orchestration and immutable
/// thereafter; every continuation carries it unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SerializedPlan(pub Vec<Vec<SerializedJob>>);

impl SerializedPlan {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn step(&self, index: usize) -> Option<&[SerializedJob]> {
        self.0.get(index).map(Vec::as_slice)
    }

    pub fn steps(&self) -> impl Iterator<Item = &[SerializedJob]> {
        self.0.iter().map(Vec::as_slice)
    }
}

/// Everything a success callback needs to resume the workflow at the next
/// step. This record is the *only* state that crosses worker invocations; it
/// round-trips through the batch service's callback persistence as plain
/// JSON, so job references appear as class-name strings only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuationState {
    pub plan: SerializedPlan,
    pub next_step_index: usize,
    pub origin_job_class_name: String,
    pub child_job_options: JobOptions,
}

impl ContinuationState {
    /// Whether the plan is exhausted and no further step should launch.
    pub fn is_terminal(&self) -> bool {
        self.next_step_index >= self.plan.len()
    }
}
