//! Alerts: the dispatch records at the centre of the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
  error::{Error, Result},
  unit::Position,
};

/// Alert priority. `P1` is the most severe.
///
/// The set is closed: inputs naming anything else fail validation at the
/// boundary instead of being stored verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
  P1,
  P2,
  P3,
  P4,
}

impl Priority {
  /// Weight contributed to the patrol risk score.
  pub fn weight(self) -> f64 {
    match self {
      Self::P1 => 1.0,
      Self::P2 => 0.7,
      Self::P3 => 0.4,
      Self::P4 => 0.2,
    }
  }
}

impl std::fmt::Display for Priority {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(match self {
      Self::P1 => "P1",
      Self::P2 => "P2",
      Self::P3 => "P3",
      Self::P4 => "P4",
    })
  }
}

/// Lifecycle status of an alert. Serialized as `open` / `ack` / `resolved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
  Open,
  #[serde(rename = "ack")]
  Acknowledged,
  Resolved,
}

impl std::fmt::Display for AlertStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(match self {
      Self::Open => "open",
      Self::Acknowledged => "ack",
      Self::Resolved => "resolved",
    })
  }
}

/// A persisted alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
  pub alert_id:         Uuid,
  /// Category label, e.g. `gunshot`, `suspicious_vehicle`. `type` on the
  /// wire, which existing detector feeds already emit.
  #[serde(rename = "type")]
  pub kind:             String,
  pub priority:         Priority,
  pub position:         Position,
  pub confidence:       f64,
  pub status:           AlertStatus,
  pub created_at:       DateTime<Utc>,
  pub resolved_at:      Option<DateTime<Utc>>,
  pub assigned_unit_id: Option<Uuid>,
  pub metadata:         Map<String, Value>,
}

/// Input for raising an alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAlert {
  #[serde(rename = "type")]
  pub kind:       String,
  pub priority:   Priority,
  pub lat:        f64,
  pub lon:        f64,
  pub confidence: f64,
  #[serde(default)]
  pub metadata:   Map<String, Value>,
}

impl NewAlert {
  /// Validate confidence and coordinates, returning the alert position.
  pub fn validate(&self) -> Result<Position> {
    if !(0.0..=1.0).contains(&self.confidence) {
      return Err(Error::InvalidConfidence(self.confidence));
    }
    Position::new(self.lat, self.lon)
  }
}
