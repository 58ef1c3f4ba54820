//! Stream HTTP handler for the web layer.
//!
//! This module contains only the Axum handler for the WebSocket stream
//! endpoint. The core fanout infrastructure (Manager, ConnectionRegistry,
//! Envelope) lives in the `fanout` crate to avoid circular dependencies.

pub mod handler;
