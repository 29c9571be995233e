use serde_json::Value;
use tokio::sync::broadcast;

/// Broadcast publisher for orchestration lifecycle events.
///
/// Publishing is fire-and-forget: a workflow must advance identically whether
/// or not anything is subscribed, so a send with no receivers is not an error
/// and nothing in the dispatch path ever waits on a subscriber.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<PublishedEvent>,
}

/// An event as seen by subscribers.
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub name: String,
    pub context: Value,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

impl EventPublisher {
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event under `name` with a JSON context payload.
    ///
    /// Returns the number of subscribers the event reached.
    pub fn publish(&self, name: impl Into<String>, context: Value) -> usize {
        let event = PublishedEvent {
            name: name.into(),
            context,
            published_at: chrono::Utc::now(),
        };

        // send() errors only when there are no receivers; lifecycle events are
        // observability, not control flow, so that case is just "reached zero".
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::with_capacity(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_publish_without_subscribers_reaches_zero() {
        let publisher = EventPublisher::with_capacity(16);
        let reached = publisher.publish("orchestration.started", json!({"batch_id": "b-1"}));
        assert_eq!(reached, 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let publisher = EventPublisher::with_capacity(16);
        let mut receiver = publisher.subscribe();

        let reached = publisher.publish("orchestration.step_enqueued", json!({"step_index": 0}));
        assert_eq!(reached, 1);

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.name, "orchestration.step_enqueued");
        assert_eq!(event.context["step_index"], 0);
    }
}
