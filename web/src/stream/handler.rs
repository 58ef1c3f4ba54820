use crate::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use log::*;
use tokio::sync::mpsc;

/// Stream handler that establishes a long-lived connection for realtime
/// pushes. Connections carry no identity and no auth context; the stream is
/// server-push-only and inbound client messages are drained but ignored.
pub(crate) async fn stream_handler(
    State(app_state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: AppState) {
    // Registration happens only after the upgrade succeeded, so the registry
    // never observes a half-open connection.
    let (tx, mut rx) = mpsc::channel(app_state.config().stream_send_buffer);
    let connection_id = app_state.relay_manager.register_connection(tx);
    debug!("Established stream connection {}", connection_id.as_str());

    let (mut sink, mut inbound) = socket.split();

    loop {
        tokio::select! {
            frame = rx.recv() => {
                match frame {
                    Some(frame) => {
                        if sink.send(frame).await.is_err() {
                            break;
                        }
                    }
                    // Sender gone: the manager dropped us after a failed
                    // push or a full buffer. Tear the socket down too.
                    None => break,
                }
            }
            message = inbound.next() => {
                match message {
                    // Client messages carry no meaning on this stream
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    debug!(
        "Stream connection {} closed, cleaning up",
        connection_id.as_str()
    );
    app_state.relay_manager.unregister_connection(&connection_id);
}
