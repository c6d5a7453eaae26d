// Event channel: the WebSocket endpoint viewers connect to

use crate::events::ViewerMessage;
use crate::hub::EventHub;
use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{debug, warn};

pub fn router(hub: Arc<EventHub>) -> Router {
    Router::new().route("/", get(ws_handler)).with_state(hub)
}

async fn ws_handler(ws: WebSocketUpgrade, State(hub): State<Arc<EventHub>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, hub))
}

/// Pump queued events out to the viewer and handle what it sends back,
/// until either side goes away or a newer viewer takes over the slot.
async fn handle_connection(socket: WebSocket, hub: Arc<EventHub>) {
    let (id, mut outbound) = hub.attach();
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = outbound.recv() => {
                let Some(event) = event else {
                    debug!("Viewer {} superseded or bridge closed, closing", id);
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                };
                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Failed to encode viewer event: {}", e);
                        continue;
                    }
                };
                if sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ViewerMessage>(&text) {
                            Ok(ViewerMessage::PageLoaded { url }) => {
                                debug!("Viewer {} loaded {}", id, url);
                                hub.replay_highlight(id);
                            }
                            Err(e) => debug!("Dropping malformed viewer message: {}", e),
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }

    hub.detach(id);
}
