//! Error types for `beat-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unit not found: {0}")]
  UnitNotFound(Uuid),

  #[error("alert not found: {0}")]
  AlertNotFound(Uuid),

  #[error("patrol not found: {0}")]
  PatrolNotFound(Uuid),

  #[error("patrol {0} has not ended; no summary is available yet")]
  SummaryNotReady(Uuid),

  #[error("coordinates out of range: lat {lat}, lon {lon}")]
  InvalidCoordinates { lat: f64, lon: f64 },

  #[error("confidence must be within [0, 1], got {0}")]
  InvalidConfidence(f64),

  #[error("result count must be at least 1")]
  InvalidResultCount,

  #[error("record store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("semantic index error: {0}")]
  Retrieval(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("generation backend error: {0}")]
  Generation(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }

  pub fn retrieval<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Retrieval(Box::new(err))
  }

  pub fn generation<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Generation(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
