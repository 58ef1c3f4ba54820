//! Event-fanout infrastructure for pushing realtime updates to stream clients.
//!
//! This crate is the core of the relay: it tracks every open client
//! connection and pushes each ingested event to all of them.
//!
//! # Architecture
//!
//! - **Connection registry**: every open `/stream` connection is one entry in
//!   a DashMap keyed by a server-generated ConnectionId - O(1) registration
//!   and cleanup, safe under concurrent connects and disconnects.
//! - **Snapshot-driven fanout**: each ingested event is delivered against a
//!   point-in-time snapshot of the registry. Connections opened after the
//!   snapshot never receive that event; connections that close mid-fanout
//!   simply miss it.
//! - **Per-connection isolation**: a broken or slow connection is logged,
//!   unregistered and skipped - it never blocks delivery to the others.
//! - **Ephemeral events**: nothing is retained after the fanout loop. A
//!   client that misses a push sees fresh data on its next full refresh;
//!   there is no history and no replay.
//! - **Bounded outbound buffers**: every connection gets a bounded frame
//!   buffer. A consumer that falls behind is disconnected rather than
//!   allowed to stall the fanout loop.
//!
//! # Message Flow
//!
//! 1. Client upgrades to a WebSocket on `/stream`
//! 2. Handler registers the connection's frame sender in the ConnectionRegistry
//! 3. The origin application reports a mutation via `POST /events/:event_type`
//! 4. The controller builds one immutable [`envelope::Envelope`] and calls
//!    [`Manager::ingest`]
//! 5. The manager serializes the envelope once, snapshots the registry and
//!    pushes the frame to every connection's buffer
//! 6. Each connection's handler task drains its buffer onto the socket
//!
//! # Modules
//!
//! - `registry`: ConnectionRegistry and type-safe ConnectionId
//! - `envelope`: the immutable `{type, payload}` wire unit
//! - `manager`: ingestion and fanout (delegates membership to the registry)

pub mod envelope;
pub mod manager;
pub mod registry;

pub use manager::Manager;
