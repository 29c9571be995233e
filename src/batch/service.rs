use async_trait::async_trait;
use serde_json::Value;

use super::types::{BatchError, BatchId, BatchStatus, CallbackEvent, CallbackRegistration};

/// Interface to the external batch service.
///
/// Implementations are expected to provide atomic job accounting and
/// at-most-once callback dispatch per batch event; nothing in this crate
/// re-checks those guarantees. All operations are issued synchronously from
/// the caller's perspective and return once the service has accepted them.
#[async_trait]
pub trait BatchService: Send + Sync {
    /// Create a batch, optionally nested under `parent`.
    ///
    /// A nested batch counts toward its parent's completion: the parent does
    /// not resolve until every child batch has resolved.
    async fn create_batch(&self, parent: Option<&BatchId>) -> Result<BatchId, BatchError>;

    /// Attach a human-readable description, surfaced in the service's UI.
    async fn set_description(&self, batch: &BatchId, description: &str)
        -> Result<(), BatchError>;

    /// Register a callback for `event` on `batch`.
    ///
    /// The registration is persisted by the service and fired later, usually
    /// on a different worker, by resolving `registration.handler` by name.
    async fn on_event(
        &self,
        batch: &BatchId,
        event: CallbackEvent,
        registration: CallbackRegistration,
    ) -> Result<(), BatchError>;

    /// Route this batch's callback jobs to a specific queue.
    async fn set_callback_queue(&self, batch: &BatchId, queue: &str) -> Result<(), BatchError>;

    /// Look up the parent of a batch.
    async fn parent_of(&self, batch: &BatchId) -> Result<Option<BatchId>, BatchError>;
}

/// Receiver side of callback dispatch.
///
/// The batch service resolves the handler name recorded in a
/// [`CallbackRegistration`] to one of these and invokes it with the event,
/// the batch's status snapshot, and the persisted payload.
#[async_trait]
pub trait CallbackHandler: Send + Sync {
    async fn handle(
        &self,
        event: CallbackEvent,
        status: &BatchStatus,
        payload: &Value,
    ) -> Result<(), BatchError>;
}
