use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use fanout::envelope::Envelope;
use log::*;
use serde_json::Value;

/// POST one "event occurred" notification and fan it out to every open
/// stream connection.
///
/// Fire-and-forget from the origin application's perspective: the response
/// is sent once fanout has been attempted against the snapshot taken at
/// call time, without waiting for any client to acknowledge receipt.
#[utoipa::path(
    post,
    path = "/events/{event_type}",
    params(
        ("event_type" = String, Path, description = "Kind of the event that occurred, e.g. item-created")
    ),
    request_body(content = String, content_type = "application/json",
        description = "JSON payload embedded verbatim in the pushed envelope"),
    responses(
        (status = 204, description = "Fanout attempted against every open connection"),
        (status = 422, description = "Request body is not valid JSON"),
    )
)]
pub async fn create(
    Path(event_type): Path<String>,
    State(app_state): State<AppState>,
    body: String,
) -> Result<impl IntoResponse, Error> {
    debug!("POST event notification: {event_type}");

    let payload: Value = serde_json::from_str(&body)?;
    app_state
        .relay_manager
        .ingest(&Envelope::new(event_type, payload));

    Ok(StatusCode::NO_CONTENT)
}
