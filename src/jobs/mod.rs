//! # Job Runner Interface
//!
//! The queue/dispatch primitive this crate delegates to: fire-and-forget
//! enqueue of a job by registered class name, with positional arguments and
//! per-job options. Delivery guarantees, retries, and backoff all belong to
//! the runner, not to this crate.
//!
//! Batch membership is explicit: a [`JobDispatch`] names the batch it runs
//! under, and a [`JobContext`] tells a running job which batch (if any) it is
//! executing inside. There is no ambient current-batch state.
//!
//! [`InProcessJobRunner`] is the native queue-backed implementation used for
//! embedded execution and tests.

pub mod inprocess;
pub mod registry;
pub mod runner;

pub use inprocess::InProcessJobRunner;
pub use registry::JobRegistry;
pub use runner::{DispatchError, Job, JobContext, JobDispatch, JobOptions, JobRunner};
