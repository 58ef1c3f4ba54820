use crate::envelope::Envelope;
use crate::registry::{ConnectionId, ConnectionRegistry, FrameSender};
use axum::extract::ws::Message;
use log::*;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;

/// Ingestion and fanout over an explicit, injectable connection registry.
///
/// One manager per process in production; one per test everywhere else.
pub struct Manager {
    registry: Arc<ConnectionRegistry>,
}

impl Manager {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
        }
    }

    /// Register a new connection and return its unique ID
    pub fn register_connection(&self, sender: FrameSender) -> ConnectionId {
        let connection_id = self.registry.register(sender);
        info!(
            "Registered stream connection ({} open)",
            self.registry.len()
        );
        connection_id
    }

    /// Unregister a connection by ID
    pub fn unregister_connection(&self, connection_id: &ConnectionId) {
        self.registry.unregister(connection_id);
        info!(
            "Unregistered stream connection ({} open)",
            self.registry.len()
        );
    }

    /// Fan one envelope out to every currently open connection.
    ///
    /// Serializes the envelope once, fixes the target set with a registry
    /// snapshot, then pushes the frame to each connection independently.
    /// Delivery is best-effort and at-most-once: a closed connection or a
    /// full outbound buffer unregisters that one connection and the loop
    /// continues with the rest. Returns the number of connections the push
    /// was attempted against.
    pub fn ingest(&self, envelope: &Envelope) -> usize {
        let frame = match envelope.to_json() {
            Ok(json) => Message::Text(json),
            Err(e) => {
                error!("Failed to serialize {} envelope: {e}", envelope.kind());
                return 0;
            }
        };

        let snapshot = self.registry.snapshot();
        let attempted = snapshot.len();

        for (connection_id, sender) in snapshot {
            match sender.try_send(frame.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!(
                        "Outbound buffer full for connection {}, disconnecting slow consumer",
                        connection_id.as_str()
                    );
                    self.registry.unregister(&connection_id);
                }
                Err(TrySendError::Closed(_)) => {
                    warn!(
                        "Connection {} closed during fanout, removing",
                        connection_id.as_str()
                    );
                    self.registry.unregister(&connection_id);
                }
            }
        }

        debug!(
            "Fanout of {} attempted against {attempted} connection(s)",
            envelope.kind()
        );
        attempted
    }

    /// Number of currently open connections.
    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tokio::sync::mpsc::{self, Receiver};

    fn connect(manager: &Manager, buffer: usize) -> (ConnectionId, Receiver<Message>) {
        let (tx, rx) = mpsc::channel(buffer);
        (manager.register_connection(tx), rx)
    }

    fn received_json(rx: &mut Receiver<Message>) -> Value {
        match rx.try_recv().expect("expected a frame") {
            Message::Text(text) => serde_json::from_str(&text).expect("frame must be JSON"),
            other => panic!("expected a text frame, got {other:?}"),
        }
    }

    fn assert_no_frame(rx: &mut Receiver<Message>) {
        assert!(rx.try_recv().is_err(), "expected no pending frame");
    }

    #[tokio::test]
    async fn test_fanout_reaches_every_open_connection_exactly_once() {
        let manager = Manager::new();
        let mut receivers: Vec<_> = (0..3).map(|_| connect(&manager, 8).1).collect();

        let attempted = manager.ingest(&Envelope::new(
            "item-created",
            json!({"id": 7, "name": "widget"}),
        ));

        assert_eq!(attempted, 3);
        for rx in &mut receivers {
            assert_eq!(
                received_json(rx),
                json!({"type": "item-created", "payload": {"id": 7, "name": "widget"}})
            );
            assert_no_frame(rx);
        }
    }

    #[tokio::test]
    async fn test_broken_connection_does_not_abort_fanout() {
        let manager = Manager::new();
        let mut alive_a = connect(&manager, 8).1;
        let broken = connect(&manager, 8);
        let mut alive_b = connect(&manager, 8).1;

        // Receiver gone before fanout: the push to it fails, the rest deliver
        drop(broken.1);

        let attempted = manager.ingest(&Envelope::new("item-created", json!({"id": 1})));

        assert_eq!(attempted, 3);
        received_json(&mut alive_a);
        received_json(&mut alive_b);
        assert_eq!(manager.connection_count(), 2);
    }

    #[tokio::test]
    async fn test_connection_opened_after_fanout_misses_the_event() {
        let manager = Manager::new();
        let mut early = connect(&manager, 8).1;

        manager.ingest(&Envelope::new("item-created", json!({"id": 1})));

        let mut late = connect(&manager, 8).1;

        received_json(&mut early);
        assert_no_frame(&mut late);
    }

    #[tokio::test]
    async fn test_envelopes_arrive_in_ingestion_order() {
        let manager = Manager::new();
        let mut rx = connect(&manager, 8).1;

        manager.ingest(&Envelope::new("item-created", json!({"id": 1})));
        manager.ingest(&Envelope::new("item-updated", json!({"id": 1, "name": "v2"})));

        assert_eq!(received_json(&mut rx)["type"], "item-created");
        assert_eq!(received_json(&mut rx)["type"], "item-updated");
    }

    #[tokio::test]
    async fn test_slow_consumer_is_disconnected() {
        let manager = Manager::new();
        let (_connection_id, mut rx) = connect(&manager, 1);

        manager.ingest(&Envelope::new("item-created", json!({"id": 1})));
        // Buffer of one is now full and nothing is draining it
        manager.ingest(&Envelope::new("item-created", json!({"id": 2})));

        assert_eq!(manager.connection_count(), 0);
        // The frame that fit is still deliverable; the second one is dropped
        assert_eq!(received_json(&mut rx)["payload"], json!({"id": 1}));
        assert_no_frame(&mut rx);
    }

    #[tokio::test]
    async fn test_close_between_events_narrows_the_target_set() {
        let manager = Manager::new();
        let mut c1 = connect(&manager, 8).1;
        let (c2_id, c2_rx) = connect(&manager, 8);
        let mut c3 = connect(&manager, 8).1;

        let first = manager.ingest(&Envelope::new(
            "item-created",
            json!({"id": 7, "name": "widget"}),
        ));
        assert_eq!(first, 3);

        // C2 disconnects: handler teardown unregisters and drops the receiver
        manager.unregister_connection(&c2_id);
        drop(c2_rx);

        let second = manager.ingest(&Envelope::new(
            "item-created",
            json!({"id": 8, "name": "gadget"}),
        ));
        assert_eq!(second, 2);

        for rx in [&mut c1, &mut c3] {
            assert_eq!(received_json(rx)["payload"], json!({"id": 7, "name": "widget"}));
            assert_eq!(received_json(rx)["payload"], json!({"id": 8, "name": "gadget"}));
        }
    }
}
