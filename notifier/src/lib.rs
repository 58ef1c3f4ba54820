//! Origin-application-side client for the relay's ingestion surface.
//!
//! The origin application performs the authoritative mutation (the system of
//! record already committed) and then reports the event here. Delivery of
//! the realtime notification is strictly best-effort: at-most-once, no
//! retries, and every failure path is swallowed after logging. A missed
//! notification must never fail the mutation that already succeeded - the
//! affected clients simply see fresh data on their next full load.
//!
//! This crate has no dependency on the relay's internal crates; event data
//! is carried as serialized JSON values.

use log::*;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Request budget for one notification call. Bounds how long the origin
/// application's request cycle can stall on an unreachable relay.
pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(2);

/// Notifications the origin application emits.
///
/// A closed sum type rather than an untyped bag of fields: adding an event
/// kind is a compile-time-exhaustive change, and the serialized form is
/// exactly the envelope the relay pushes to clients. Payloads are carried as
/// `serde_json::Value` to keep this crate decoupled from the origin
/// application's entity types.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum Notification {
    /// A record was inserted.
    ItemCreated(Value),
    /// A record was modified.
    ItemUpdated(Value),
    /// A record was removed.
    ItemDeleted(Value),
}

impl Notification {
    /// The event-type string used as the ingestion route segment.
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::ItemCreated(_) => "item-created",
            Notification::ItemUpdated(_) => "item-updated",
            Notification::ItemDeleted(_) => "item-deleted",
        }
    }

    pub fn payload(&self) -> &Value {
        match self {
            Notification::ItemCreated(payload)
            | Notification::ItemUpdated(payload)
            | Notification::ItemDeleted(payload) => payload,
        }
    }
}

/// Fire-and-forget client for `POST /events/<kind>`.
pub struct Notifier {
    client: reqwest::Client,
    base_url: String,
}

impl Notifier {
    /// `base_url` is the relay root, e.g. `http://127.0.0.1:4000`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Report one event occurrence, best-effort.
    ///
    /// Timeouts, refused connections and non-success statuses are logged and
    /// swallowed: the relay being down costs clients one realtime update,
    /// nothing more.
    pub async fn notify(&self, notification: &Notification) {
        let url = format!("{}/events/{}", self.base_url, notification.kind());

        match self
            .client
            .post(&url)
            .json(notification.payload())
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                debug!("Delivered {} notification", notification.kind());
            }
            Ok(response) => {
                warn!(
                    "Relay rejected {} notification: {}",
                    notification.kind(),
                    response.status()
                );
            }
            Err(e) => {
                warn!(
                    "Failed to reach relay with {} notification: {e}",
                    notification.kind()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_matches_ingestion_route_segment() {
        assert_eq!(Notification::ItemCreated(json!({})).kind(), "item-created");
        assert_eq!(Notification::ItemUpdated(json!({})).kind(), "item-updated");
        assert_eq!(Notification::ItemDeleted(json!({})).kind(), "item-deleted");
    }

    #[test]
    fn test_serialized_form_matches_relay_wire_envelope() {
        let notification = Notification::ItemCreated(json!({"id": 7, "name": "widget"}));
        let serialized = serde_json::to_string(&notification).unwrap();

        // Compare as Values since serde_json key order is non-deterministic
        let deserialized: Value = serde_json::from_str(&serialized).unwrap();
        assert_eq!(
            deserialized,
            json!({"type": "item-created", "payload": {"id": 7, "name": "widget"}})
        );
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_swallowed() {
        // Discard port: nothing listens there, the send must fail quietly
        let notifier =
            Notifier::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();

        notifier
            .notify(&Notification::ItemDeleted(json!({"id": 7})))
            .await;
    }
}
