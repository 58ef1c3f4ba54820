use serde::Serialize;
use serde_json::Value;

/// The immutable unit of fanout.
///
/// Built once per ingestion call from the event type on the route and the
/// JSON body, serialized exactly once before fanout begins, and dropped when
/// the fanout loop finishes. Wire shape:
///
/// ```json
/// {"type": "item-created", "payload": {"id": 7, "name": "widget"}}
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    payload: Value,
}

impl Envelope {
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// The event type string, e.g. `item-created`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
