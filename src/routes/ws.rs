//! WebSocket upgrade + practice session loop.
//!
//! One socket, one [`PracticeSession`], one task. The loop multiplexes client
//! frames, countdown ticks and the session's outbox, so every mutation of the
//! session happens on this task in arrival order.

use std::sync::Arc;

use axum::{
  extract::{
    ws::{Message, WebSocket},
    Query, State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use crate::auth::AuthSession;
use crate::protocol::{ClientWsMessage, ServerWsMessage, WsQuery};
use crate::seeds::DEFAULT_CODE;
use crate::session::{PracticeSession, SessionCatalogs};
use crate::state::AppState;

#[instrument(level = "info", skip_all, fields(example = ?q.example))]
pub async fn ws_upgrade(
  ws: WebSocketUpgrade,
  State(state): State<Arc<AppState>>,
  Query(q): Query<WsQuery>,
  header_auth: AuthSession,
) -> impl IntoResponse {
  // Browsers cannot set headers on a socket, so the token may also arrive in the query.
  let auth = match q.token.as_deref() {
    Some(token) if !header_auth.is_authenticated() => AuthSession::resolve(&state, Some(token)).await,
    _ => header_auth,
  };

  let initial = match q.example {
    Some(id) => match state.store.example(id).await {
      Some(example) => example.code,
      None => {
        warn!(target: "session", id, "Unknown example requested; using the default document");
        DEFAULT_CODE.to_string()
      }
    },
    None => DEFAULT_CODE.to_string(),
  };

  info!(target: "session", authenticated = auth.is_authenticated(), "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state, auth, initial))
}

async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>, auth: AuthSession, initial: String) {
  let (tick_tx, mut tick_rx) = mpsc::unbounded_channel();
  let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ServerWsMessage>();
  let errors = out_tx.clone();

  let catalogs = SessionCatalogs {
    challenges: state.catalog.clone(),
    templates: state.templates.clone(),
    snippets: state.snippets.clone(),
  };
  let mut session = PracticeSession::new(auth, initial, catalogs, state.session_gateway.clone(), tick_tx, out_tx);
  let session_id = session.id();
  info!(target: "session", %session_id, "WebSocket connected");
  session.mount();

  loop {
    tokio::select! {
      frame = socket.recv() => match frame {
        Some(Ok(Message::Text(txt))) => match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "session", %session_id, "WS received: {:?}", &incoming);
            session.handle(incoming);
          }
          Err(e) => {
            let _ = errors.send(ServerWsMessage::error(format!("Invalid JSON: {}", e)));
          }
        },
        Some(Ok(Message::Ping(payload))) => {
          let _ = socket.send(Message::Pong(payload)).await;
        }
        Some(Ok(Message::Close(_))) | None => break,
        Some(Ok(_)) => {}
        Some(Err(e)) => {
          warn!(target: "session", %session_id, error = %e, "WS receive error");
          break;
        }
      },
      Some(tick) = tick_rx.recv() => session.on_tick(tick),
      Some(msg) = out_rx.recv() => {
        let out = serde_json::to_string(&msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });
        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "session", %session_id, error = %e, "WS send error");
          break;
        }
      }
    }
  }

  // Dropping the session aborts any running countdown.
  drop(session);
  info!(target: "session", %session_id, "WebSocket disconnected");
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::routes::build_router;
  use futures_util::{SinkExt, Stream, StreamExt};
  use serde_json::{json, Value};
  use std::net::SocketAddr;
  use tokio_tungstenite::{connect_async, tungstenite};

  async fn serve(state: Arc<AppState>) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(state);
    tokio::spawn(async move {
      let _ = axum::serve(listener, app).await;
    });
    addr
  }

  async fn next_of_type<S>(ws: &mut S, kind: &str) -> Value
  where
    S: Stream<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
  {
    for _ in 0..16 {
      match ws.next().await {
        Some(Ok(tungstenite::Message::Text(txt))) => {
          let v: Value = serde_json::from_str(&txt).unwrap();
          if v["type"] == kind {
            return v;
          }
        }
        Some(Ok(_)) => {}
        other => panic!("socket ended while waiting for {kind}: {other:?}"),
      }
    }
    panic!("no {kind} message arrived");
  }

  #[tokio::test]
  async fn query_token_and_example_shape_the_session() {
    let state = Arc::new(AppState::for_tests());
    let user = state.store.register("ada", "pw").await.unwrap();
    let (_, token) = state.store.login("ada", "pw").await.unwrap();
    let example = state.store.example(1).await.unwrap();
    let addr = serve(state.clone()).await;

    let (mut ws, _) = connect_async(format!("ws://{addr}/ws?token={token}&example=1")).await.unwrap();
    let doc = next_of_type(&mut ws, "document").await;
    assert_eq!(doc["text"], example.code.as_str());

    ws.send(tungstenite::Message::Text(json!({ "type": "save", "title": "From the socket" }).to_string()))
      .await
      .unwrap();
    let saved = next_of_type(&mut ws, "saved").await;
    assert_eq!(saved["work"]["title"], "From the socket");
    assert_eq!(state.store.saved_work_by_user(user.id).await.len(), 1);
  }

  #[tokio::test]
  async fn anonymous_socket_with_unknown_example_gets_the_default_document() {
    let state = Arc::new(AppState::for_tests());
    let addr = serve(state).await;

    let (mut ws, _) = connect_async(format!("ws://{addr}/ws?token=bogus&example=9999")).await.unwrap();
    let doc = next_of_type(&mut ws, "document").await;
    assert_eq!(doc["text"], DEFAULT_CODE);

    ws.send(tungstenite::Message::Text(json!({ "type": "save", "title": "Nope" }).to_string()))
      .await
      .unwrap();
    let notice = next_of_type(&mut ws, "notice").await;
    assert_eq!(notice["message"], "Please log in to save your work.");
  }
}
