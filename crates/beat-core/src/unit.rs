//! Field units and their reported positions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Role tag applied when a unit is registered without one.
pub const DEFAULT_ROLE: &str = "officer";

/// A geographic position in decimal degrees (WGS 84).
///
/// Build through [`Position::new`] so out-of-range (or NaN) coordinates are
/// rejected before they reach assignment or storage. Deserialization funnels
/// through the same check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPosition")]
pub struct Position {
  pub lat: f64,
  pub lon: f64,
}

impl Position {
  /// Validate and construct a position.
  pub fn new(lat: f64, lon: f64) -> Result<Self> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
      return Err(Error::InvalidCoordinates { lat, lon });
    }
    Ok(Self { lat, lon })
  }
}

/// Unchecked wire shape for [`Position`].
#[derive(Deserialize)]
struct RawPosition {
  lat: f64,
  lon: f64,
}

impl TryFrom<RawPosition> for Position {
  type Error = Error;

  fn try_from(raw: RawPosition) -> Result<Self> {
    Self::new(raw.lat, raw.lon)
  }
}

/// A field unit (patrol officer, vehicle, drone) known to dispatch.
///
/// `last_position` is refreshed by external location reports; a unit without
/// one never participates in assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
  pub unit_id:       Uuid,
  pub name:          String,
  pub role:          String,
  pub last_position: Option<Position>,
  pub last_seen_at:  Option<DateTime<Utc>>,
}

/// Input for registering a unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUnit {
  pub name:     String,
  /// Defaults to [`DEFAULT_ROLE`] when absent.
  pub role:     Option<String>,
  pub position: Option<Position>,
}
