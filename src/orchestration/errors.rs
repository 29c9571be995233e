use crate::batch::BatchError;
use crate::jobs::DispatchError;

/// Errors that can occur while building or executing an orchestration.
#[derive(Debug, thiserror::Error)]
pub enum OrchestrationError {
    /// `in_parallel` was called inside an already-open parallel scope. The
    /// step model is a flat list of serial steps, so nesting has no meaning;
    /// rejecting it keeps the misuse from silently corrupting step grouping.
    #[error("in_parallel scopes cannot be nested")]
    NestedParallel,

    /// A continuation referenced a step index outside the plan.
    #[error("Step index {index} out of range for plan of {len} steps")]
    StepOutOfRange { index: usize, len: usize },

    /// A plan carried an empty step. The builder never serializes one, so
    /// this only arises from a hand-crafted or corrupted plan.
    #[error("Step {index} contains no jobs")]
    EmptyStep { index: usize },

    /// A completed step batch had no parent to re-enter, so the next step
    /// has nowhere to nest.
    #[error("Completed batch {batch_id} has no parent scope to continue under")]
    MissingParentScope { batch_id: crate::batch::BatchId },

    #[error("Batch service error: {0}")]
    Batch(#[from] BatchError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type OrchestrationResult<T> = Result<T, OrchestrationError>;
