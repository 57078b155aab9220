//! WebSocket endpoint backing the live unit channels.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET` | `/ws/units/{unit_id}` | Upgrades; one channel per unit |
//!
//! Each socket registers a [`ChannelSink`] with the connection registry and
//! then pumps queued notifications out until either side goes away. A
//! reconnect for the same unit replaces the registered sink, which ends the
//! older pump.

use std::sync::Arc;

use axum::{
  extract::{
    Path, State,
    ws::{Message, WebSocket, WebSocketUpgrade},
  },
  response::Response,
};
use beat_core::{
  briefing::GenerationBackend,
  registry::{ConnectionRegistry, NotificationSink, SinkClosed},
  retrieval::SemanticIndex,
  store::DispatchStore,
};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::AppState;

/// Bridges the registry's non-blocking sends onto the socket task.
struct ChannelSink {
  tx: mpsc::UnboundedSender<String>,
}

impl NotificationSink for ChannelSink {
  fn is_open(&self) -> bool {
    !self.tx.is_closed()
  }

  fn send_text(&self, text: String) -> Result<(), SinkClosed> {
    self.tx.send(text).map_err(|_| SinkClosed)
  }
}

/// `GET /ws/units/{unit_id}` — upgrades to the unit's live channel.
pub async fn attach<S, X, G>(
  State(state): State<AppState<S, X, G>>,
  Path(unit_id): Path<Uuid>,
  upgrade: WebSocketUpgrade,
) -> Response
where
  S: DispatchStore + 'static,
  X: SemanticIndex + 'static,
  G: GenerationBackend + 'static,
{
  let registry = Arc::clone(&state.registry);
  upgrade.on_upgrade(move |socket| pump(socket, unit_id, registry))
}

async fn pump(
  mut socket: WebSocket,
  unit_id: Uuid,
  registry: Arc<ConnectionRegistry>,
) {
  let (tx, mut rx) = mpsc::unbounded_channel();
  let token = registry.connect(unit_id, Arc::new(ChannelSink { tx }));
  tracing::info!(%unit_id, "live channel connected");

  loop {
    tokio::select! {
      queued = rx.recv() => {
        // `None` means the registry dropped this sink for a newer one.
        let Some(text) = queued else { break };
        if socket.send(Message::Text(text.into())).await.is_err() {
          break;
        }
      }
      inbound = socket.recv() => {
        // Inbound traffic is liveness only; the payloads carry nothing.
        match inbound {
          Some(Ok(_)) => {}
          Some(Err(_)) | None => break,
        }
      }
    }
  }

  registry.disconnect(unit_id, token);
  tracing::info!(%unit_id, "live channel disconnected");
}
