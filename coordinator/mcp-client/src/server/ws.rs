/// WebSocket endpoint
///
/// Flow:
/// 1. Client connects to `/ws/:session_id`
/// 2. Server mints an ephemeral `ws_user_*` id and sends `session_init`
/// 3. Loop: client sends a text query, server streams one `event` frame per
///    policy event, marking the final one with `is_final`
/// 4. A client close ends the loop; any other failure sends an `error`
///    frame and closes the socket
///
/// The connection holds its session handle while open, so idle eviction never
/// drops the history of a live socket.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Extension, Path, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};

use super::{short_id, AppState};
use crate::event::QueryEvent;

/// Frames sent to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    SessionInit {
        user_id: String,
        session_id: String,
    },
    Event {
        id: String,
        author: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_final: Option<bool>,
    },
    Error {
        message: String,
    },
}

impl From<&QueryEvent> for ServerFrame {
    fn from(event: &QueryEvent) -> Self {
        ServerFrame::Event {
            id: event.id.clone(),
            author: event.author.clone(),
            text: event.text.clone(),
            is_final: event.is_final.then_some(true),
        }
    }
}

/// How the query loop ended
enum LoopEnd {
    /// Client closed or went away.
    Disconnected,
    Failed(String),
}

/// GET /ws/:session_id - upgrade to WebSocket.
pub async fn websocket(
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    Extension(state): Extension<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, session_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, session_id: String) {
    let (mut ws_sink, mut ws_stream) = socket.split();

    // Each connection is a fresh identity; a reused session_id does not resume
    // a session created by another connection.
    let user_id = format!("ws_user_{}", short_id());
    let key = state.dispatcher.session_key(&user_id, &session_id);

    let end = match state.dispatcher.sessions().handle_or_create(&key) {
        Ok(_pinned) => {
            tracing::info!("[WS] Connected - user {}, session {}", user_id, session_id);
            let init = ServerFrame::SessionInit {
                user_id: user_id.clone(),
                session_id: session_id.clone(),
            };
            if send_frame(&mut ws_sink, &init).await.is_err() {
                LoopEnd::Disconnected
            } else {
                serve_queries(&mut ws_sink, &mut ws_stream, &state, &user_id, &session_id).await
            }
        }
        Err(e) => LoopEnd::Failed(e.to_string()),
    };

    match end {
        LoopEnd::Disconnected => {
            tracing::info!("[WS] Disconnected - user {}, session {}", user_id, session_id);
        }
        LoopEnd::Failed(message) => {
            tracing::warn!("[WS] Closing session {} after error: {}", session_id, message);
            let _ = send_frame(&mut ws_sink, &ServerFrame::Error { message }).await;
            let _ = ws_sink.send(Message::Close(None)).await;
        }
    }
}

async fn serve_queries(
    ws_sink: &mut SplitSink<WebSocket, Message>,
    ws_stream: &mut SplitStream<WebSocket>,
    state: &AppState,
    user_id: &str,
    session_id: &str,
) -> LoopEnd {
    while let Some(incoming) = ws_stream.next().await {
        let query = match incoming {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => return LoopEnd::Disconnected,
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!("[WS] Receive error: {}", e);
                return LoopEnd::Disconnected;
            }
        };

        let mut events = state.dispatcher.stream(user_id, session_id, &query);
        while let Some(event) = events.next().await {
            let event = match event {
                Ok(event) => event,
                Err(e) => return LoopEnd::Failed(e.to_string()),
            };
            if send_frame(ws_sink, &ServerFrame::from(&event)).await.is_err() {
                return LoopEnd::Disconnected;
            }
        }
    }
    LoopEnd::Disconnected
}

async fn send_frame(
    ws_sink: &mut SplitSink<WebSocket, Message>,
    frame: &ServerFrame,
) -> Result<(), axum::Error> {
    let text = serde_json::to_string(frame).map_err(axum::Error::new)?;
    ws_sink.send(Message::Text(text)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_frame_omits_absent_fields() {
        let event = QueryEvent::agent_text("inv_1", "coordinator", "Transferring to hotels_agent");
        let frame = serde_json::to_value(ServerFrame::from(&event)).unwrap();
        assert_eq!(frame["type"], "event");
        assert_eq!(frame["author"], "coordinator");
        assert!(frame.get("is_final").is_none());

        let mut silent = event.clone();
        silent.text = None;
        silent.is_final = true;
        let frame = serde_json::to_value(ServerFrame::from(&silent)).unwrap();
        assert!(frame.get("text").is_none());
        assert_eq!(frame["is_final"], true);
    }

    #[test]
    fn test_session_init_shape() {
        let frame = ServerFrame::SessionInit {
            user_id: "ws_user_1234abcd".to_string(),
            session_id: "trip".to_string(),
        };
        assert_eq!(
            serde_json::to_value(frame).unwrap(),
            json!({"type": "session_init", "user_id": "ws_user_1234abcd", "session_id": "trip"})
        );
    }
}
