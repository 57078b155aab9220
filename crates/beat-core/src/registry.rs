//! Live notification channels for connected units.
//!
//! The registry is constructed by whoever assembles the application (the
//! server binary, a test) and injected into the dispatch service and the
//! socket layer. One entry per unit: a reconnect replaces the previous
//! channel, and only the most recent connection is addressable. Nothing is
//! queued for absent units and nothing here survives a restart.

use std::{
  collections::HashMap,
  sync::{
    Arc, RwLock, RwLockReadGuard, RwLockWriteGuard,
    atomic::{AtomicU64, Ordering},
  },
};

use thiserror::Error;
use uuid::Uuid;

use crate::dispatch::DispatchNotification;

/// The sink's transport has shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("notification channel closed")]
pub struct SinkClosed;

/// Transport half of a live connection.
///
/// `send_text` must not block; implementations back it with an unbounded
/// queue or an equivalent non-blocking primitive.
pub trait NotificationSink: Send + Sync {
  /// Whether the underlying transport can still accept messages.
  fn is_open(&self) -> bool;

  /// Queue one serialized message. Errors only when the transport is gone.
  fn send_text(&self, text: String) -> Result<(), SinkClosed>;
}

/// Handle identifying one `connect` call.
///
/// Disconnect requires the matching token, so a stale reader loop can never
/// evict a successor connection for the same unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionToken(u64);

/// Outcome of a best-effort delivery attempt. Never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
  /// Queued on the unit's live channel.
  Delivered,
  /// No live connection for the unit; message dropped.
  NotConnected,
  /// A connection existed but its transport was gone; message dropped.
  Closed,
}

struct Entry {
  token: u64,
  sink:  Arc<dyn NotificationSink>,
}

/// Registry of live unit connections.
#[derive(Default)]
pub struct ConnectionRegistry {
  entries:    RwLock<HashMap<Uuid, Entry>>,
  next_token: AtomicU64,
}

impl ConnectionRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  // A poisoned lock only means some holder panicked; the map itself is
  // still usable.
  fn read_entries(&self) -> RwLockReadGuard<'_, HashMap<Uuid, Entry>> {
    self.entries.read().unwrap_or_else(|e| e.into_inner())
  }

  fn write_entries(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, Entry>> {
    self.entries.write().unwrap_or_else(|e| e.into_inner())
  }

  /// Register `sink` as the live channel for `unit_id`, replacing any
  /// previous one.
  pub fn connect(
    &self,
    unit_id: Uuid,
    sink: Arc<dyn NotificationSink>,
  ) -> ConnectionToken {
    let token = self.next_token.fetch_add(1, Ordering::Relaxed);
    self.write_entries().insert(unit_id, Entry { token, sink });
    ConnectionToken(token)
  }

  /// Drop the entry for `unit_id` if `token` still identifies it.
  ///
  /// A token from a replaced connection is a no-op, as is an unknown unit.
  pub fn disconnect(&self, unit_id: Uuid, token: ConnectionToken) {
    let mut entries = self.write_entries();
    if entries.get(&unit_id).is_some_and(|e| e.token == token.0) {
      entries.remove(&unit_id);
    }
  }

  /// Offer `message` to the unit's live channel, if any.
  ///
  /// At most one attempt; messages for absent or dead channels are dropped.
  pub fn send(&self, unit_id: Uuid, message: &DispatchNotification) -> Delivery {
    let sink = {
      let entries = self.read_entries();
      match entries.get(&unit_id) {
        Some(entry) => Arc::clone(&entry.sink),
        None => return Delivery::NotConnected,
      }
    };
    if !sink.is_open() {
      return Delivery::Closed;
    }
    // An unserializable payload is dropped like a dead channel.
    let Ok(text) = serde_json::to_string(message) else {
      return Delivery::Closed;
    };
    match sink.send_text(text) {
      Ok(()) => Delivery::Delivered,
      Err(SinkClosed) => Delivery::Closed,
    }
  }

  /// Number of currently registered connections.
  pub fn connection_count(&self) -> usize {
    self.read_entries().len()
  }
}
