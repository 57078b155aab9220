//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Alert metadata is stored as
//! compact JSON. UUIDs are stored as hyphenated lowercase strings.

use beat_core::{
  alert::{Alert, AlertStatus, Priority},
  briefing::SummaryMode,
  patrol::{Patrol, PatrolPhase},
  unit::{Position, Unit},
};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Priority ────────────────────────────────────────────────────────────────

pub fn encode_priority(p: Priority) -> &'static str {
  match p {
    Priority::P1 => "P1",
    Priority::P2 => "P2",
    Priority::P3 => "P3",
    Priority::P4 => "P4",
  }
}

pub fn decode_priority(s: &str) -> Result<Priority> {
  match s {
    "P1" => Ok(Priority::P1),
    "P2" => Ok(Priority::P2),
    "P3" => Ok(Priority::P3),
    "P4" => Ok(Priority::P4),
    other => Err(Error::Decode(format!("unknown priority: {other:?}"))),
  }
}

// ─── AlertStatus ─────────────────────────────────────────────────────────────

pub fn encode_status(s: AlertStatus) -> &'static str {
  match s {
    AlertStatus::Open => "open",
    AlertStatus::Acknowledged => "ack",
    AlertStatus::Resolved => "resolved",
  }
}

pub fn decode_status(s: &str) -> Result<AlertStatus> {
  match s {
    "open" => Ok(AlertStatus::Open),
    "ack" => Ok(AlertStatus::Acknowledged),
    "resolved" => Ok(AlertStatus::Resolved),
    other => Err(Error::Decode(format!("unknown alert status: {other:?}"))),
  }
}

// ─── SummaryMode ─────────────────────────────────────────────────────────────

pub fn encode_mode(m: SummaryMode) -> &'static str {
  match m {
    SummaryMode::Generated => "generated",
    SummaryMode::Template => "template",
  }
}

pub fn decode_mode(s: &str) -> Result<SummaryMode> {
  match s {
    "generated" => Ok(SummaryMode::Generated),
    "template" => Ok(SummaryMode::Template),
    other => Err(Error::Decode(format!("unknown summary mode: {other:?}"))),
  }
}

// ─── Metadata ────────────────────────────────────────────────────────────────

pub fn encode_metadata(m: &Map<String, Value>) -> Result<String> {
  Ok(serde_json::to_string(m)?)
}

pub fn decode_metadata(s: &str) -> Result<Map<String, Value>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Position pairs ──────────────────────────────────────────────────────────

/// Rebuild an optional position from its column pair.
///
/// Stored rows were validated on the way in, so the pair is trusted; a
/// half-set pair means outside interference and fails the decode.
pub fn decode_position(
  lat: Option<f64>,
  lon: Option<f64>,
  what: &str,
) -> Result<Option<Position>> {
  match (lat, lon) {
    (Some(lat), Some(lon)) => Ok(Some(Position { lat, lon })),
    (None, None) => Ok(None),
    _ => Err(Error::Decode(format!("{what} has a half-set position"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `units` row.
pub struct RawUnit {
  pub unit_id:      String,
  pub name:         String,
  pub role:         String,
  pub last_lat:     Option<f64>,
  pub last_lon:     Option<f64>,
  pub last_seen_at: Option<String>,
}

impl RawUnit {
  pub fn into_unit(self) -> Result<Unit> {
    let unit_id = decode_uuid(&self.unit_id)?;
    Ok(Unit {
      unit_id,
      name: self.name,
      role: self.role,
      last_position: decode_position(
        self.last_lat,
        self.last_lon,
        &format!("unit {unit_id}"),
      )?,
      last_seen_at: self.last_seen_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw strings read directly from an `alerts` row.
pub struct RawAlert {
  pub alert_id:         String,
  pub kind:             String,
  pub priority:         String,
  pub lat:              f64,
  pub lon:              f64,
  pub confidence:       f64,
  pub status:           String,
  pub created_at:       String,
  pub resolved_at:      Option<String>,
  pub assigned_unit_id: Option<String>,
  pub metadata:         String,
}

impl RawAlert {
  pub fn into_alert(self) -> Result<Alert> {
    Ok(Alert {
      alert_id:         decode_uuid(&self.alert_id)?,
      kind:             self.kind,
      priority:         decode_priority(&self.priority)?,
      position:         Position { lat: self.lat, lon: self.lon },
      confidence:       self.confidence,
      status:           decode_status(&self.status)?,
      created_at:       decode_dt(&self.created_at)?,
      resolved_at:      self.resolved_at.as_deref().map(decode_dt).transpose()?,
      assigned_unit_id: self
        .assigned_unit_id
        .as_deref()
        .map(decode_uuid)
        .transpose()?,
      metadata:         decode_metadata(&self.metadata)?,
    })
  }
}

/// Raw strings read directly from a `patrols` row.
pub struct RawPatrol {
  pub patrol_id:      String,
  pub unit_id:        String,
  pub started_at:     String,
  pub start_lat:      Option<f64>,
  pub start_lon:      Option<f64>,
  pub location_text:  Option<String>,
  pub ended_at:       Option<String>,
  pub summary:        Option<String>,
  pub risk_score:     Option<f64>,
  pub generated_with: Option<String>,
}

impl RawPatrol {
  pub fn into_patrol(self) -> Result<Patrol> {
    let patrol_id = decode_uuid(&self.patrol_id)?;

    let phase = match (self.ended_at, self.summary, self.risk_score, self.generated_with) {
      (Some(ended), Some(summary), Some(risk_score), Some(mode)) => {
        PatrolPhase::Completed {
          ended_at: decode_dt(&ended)?,
          summary,
          risk_score,
          generated_with: decode_mode(&mode)?,
        }
      }
      (None, None, None, None) => PatrolPhase::Active,
      _ => return Err(Error::CorruptPatrol(patrol_id)),
    };

    Ok(Patrol {
      patrol_id,
      unit_id: decode_uuid(&self.unit_id)?,
      started_at: decode_dt(&self.started_at)?,
      start_position: decode_position(
        self.start_lat,
        self.start_lon,
        &format!("patrol {patrol_id}"),
      )?,
      location_text: self.location_text,
      phase,
    })
  }
}
