//! # Event System
//!
//! Broadcast-based lifecycle events for orchestration observability.
//!
//! The executor publishes an event per orchestration lifecycle transition so
//! embedding processes can subscribe without being in the dispatch path.

pub mod publisher;

pub use publisher::{EventPublisher, PublishedEvent};

/// Event names published by the orchestration executor.
pub mod names {
    /// An orchestration batch was created and its first step kicked off.
    pub const ORCHESTRATION_STARTED: &str = "orchestration.started";
    /// A step batch was created and its jobs dispatched.
    pub const STEP_ENQUEUED: &str = "orchestration.step_enqueued";
    /// A step batch reported full success and the next step was scheduled.
    pub const STEP_COMPLETED: &str = "orchestration.step_completed";
}
