//! Event bus for run progress, built on tokio broadcast channels

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::types::{Event, EventEnvelope};

/// Capacity for the broadcast channel
const DEFAULT_CAPACITY: usize = 256;

/// Event bus for publishing and subscribing to run progress
///
/// Publishing never blocks: with no subscribers the event is dropped, and a
/// subscriber that falls behind loses the oldest events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Wrap `event` in an envelope and publish it.
    ///
    /// Returns the number of subscribers that received it.
    pub fn emit(&self, event: Event) -> usize {
        self.publish(EventEnvelope::new(event))
    }

    pub fn publish(&self, envelope: EventEnvelope) -> usize {
        self.sender.send(envelope).unwrap_or(0)
    }

    /// Events published before subscribing are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// Feed every received event to `handle` until a run finishes or the bus
/// closes. Lagged events are skipped.
pub async fn drain_run<F>(mut rx: broadcast::Receiver<EventEnvelope>, mut handle: F)
where
    F: FnMut(&EventEnvelope),
{
    loop {
        match rx.recv().await {
            Ok(envelope) => {
                handle(&envelope);
                if envelope.event.is_terminal() {
                    break;
                }
            }
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_publish_subscribe() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        let envelope = EventEnvelope::new(Event::RunStarted {
            run_id: Uuid::new_v4(),
            total_steps: 9,
        });

        let sent = bus.publish(envelope.clone());
        assert_eq!(sent, 1);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, envelope.id);
    }

    #[tokio::test]
    async fn test_emit_without_subscribers() {
        let bus = EventBus::new();
        let sent = bus.emit(Event::StepSkipped {
            run_id: Uuid::new_v4(),
            step: "validation".to_string(),
        });
        assert_eq!(sent, 0);
    }

    #[tokio::test]
    async fn test_drain_stops_at_run_finished() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        let run_id = Uuid::new_v4();

        bus.emit(Event::RunStarted {
            run_id,
            total_steps: 1,
        });
        bus.emit(Event::RunFinished {
            run_id,
            state: "done".to_string(),
        });
        // Published after the terminal event; never seen
        bus.emit(Event::RunStarted {
            run_id: Uuid::new_v4(),
            total_steps: 1,
        });

        let mut seen = Vec::new();
        drain_run(rx, |env| seen.push(env.event.clone())).await;

        assert_eq!(seen.len(), 2);
        assert!(seen[1].is_terminal());
    }

    #[tokio::test]
    async fn test_drain_stops_when_bus_dropped() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        bus.emit(Event::StepSkipped {
            run_id: Uuid::new_v4(),
            step: "data-setup".to_string(),
        });
        drop(bus);

        let mut count = 0;
        drain_run(rx, |_| count += 1).await;
        assert_eq!(count, 1);
    }

    #[test]
    fn test_clone_shares_channel() {
        let bus1 = EventBus::new();
        let bus2 = bus1.clone();

        let _rx = bus2.subscribe();
        assert_eq!(bus1.subscriber_count(), 1);
        assert_eq!(bus2.subscriber_count(), 1);
    }
}
