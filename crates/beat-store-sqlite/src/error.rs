//! Error type for `beat-store-sqlite`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("column decode error: {0}")]
  Decode(String),

  /// A `patrols` row with some but not all debrief columns set. The schema
  /// CHECK forbids writing one; seeing it means the file was edited outside
  /// this store.
  #[error("patrol {0} row is half-completed")]
  CorruptPatrol(Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
