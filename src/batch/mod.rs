//! # Batch Service Interface
//!
//! The batch primitive this crate orchestrates over: an externally managed
//! group of dispatched jobs with atomic success/complete/death callback
//! semantics. This crate never implements the primitive's persistence or
//! delivery guarantees; it speaks to it through the [`BatchService`] trait
//! and receives callbacks through [`CallbackHandler`].
//!
//! ## Architecture
//!
//! - **Explicit scope threading**: batch nesting and "add this job to that
//!   batch" are expressed by passing [`BatchId`] values, never by ambient
//!   thread- or task-local state. Re-entering a completed batch's parent
//!   scope is just creating the next batch with that parent id.
//! - **Named-handler callbacks**: a callback registration pairs a handler
//!   name with a plain-data payload. Whatever fires the callback later (a
//!   different worker process, typically) resolves the handler by name and
//!   hands it the payload back. Nothing live crosses the boundary.
//!
//! [`InMemoryBatchService`] is the in-process implementation of the contract,
//! used for embedded execution and the integration test suite.

pub mod inmemory;
pub mod service;
pub mod types;

pub use inmemory::InMemoryBatchService;
pub use service::{BatchService, CallbackHandler};
pub use types::{BatchError, BatchId, BatchStatus, CallbackEvent, CallbackRegistration};
