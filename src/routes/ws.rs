//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to the practice session. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "mathtutor_engine", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "mathtutor_engine", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "mathtutor_engine", ?incoming, "WS received");
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error { code: "invalid_json".into(), message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "code": "serialization", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "mathtutor_engine", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "mathtutor_engine", "WebSocket disconnected");
}

/// Dispatch one client message to the session. Engine errors become `error` messages.
pub async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  let session = &state.session;
  let reply = match msg {
    ClientWsMessage::Ping => Ok(ServerWsMessage::Pong),

    ClientWsMessage::NextQuestion { learner_id, topic } => session
      .get_next_question(&learner_id, &topic)
      .await
      .map(|question| ServerWsMessage::Question { question }),

    ClientWsMessage::SubmitAnswer { learner_id, topic, answer } => session
      .submit_answer(&learner_id, &topic, &answer)
      .await
      .map(ServerWsMessage::AnswerResult),

    ClientWsMessage::Hint { learner_id } => session.get_hint(&learner_id).await.map(ServerWsMessage::Hint),

    ClientWsMessage::Progress { learner_id } => session.get_progress(&learner_id).await.map(ServerWsMessage::Progress),
  };
  reply.unwrap_or_else(ServerWsMessage::from)
}
