use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc::Sender;

/// Sending half of a connection's bounded outbound frame buffer.
///
/// This is the only handle the registry holds for a connection: it can push
/// frames and it reports closure when the receiving half is gone.
pub type FrameSender = Sender<Message>;

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// The set of currently open connections.
///
/// Membership changes (`register`/`unregister`) are the only mutations; a
/// connection itself is never modified. The registry may be mutated while a
/// fanout over a prior [`snapshot`](ConnectionRegistry::snapshot) is in
/// flight - DashMap keeps that safe.
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, FrameSender>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Register a new connection - O(1)
    ///
    /// The connection is eligible for fanout as soon as this returns.
    pub fn register(&self, sender: FrameSender) -> ConnectionId {
        let connection_id = ConnectionId::new();
        self.connections.insert(connection_id.clone(), sender);
        connection_id
    }

    /// Unregister a connection - O(1)
    ///
    /// Idempotent: the transport layer can deliver duplicate closure signals
    /// (handler teardown racing a failed send), and both callers must be
    /// able to unregister without caring who won.
    pub fn unregister(&self, connection_id: &ConnectionId) {
        self.connections.remove(connection_id);
    }

    /// Point-in-time view of the current membership.
    ///
    /// Fixes the delivery target set for one fanout pass. Never blocks on
    /// consumers; connections registered after the call are not included.
    pub fn snapshot(&self) -> Vec<(ConnectionId, FrameSender)> {
        self.connections
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Number of currently open connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
