//! [`SqliteStore`], the SQLite implementation of [`DispatchStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use beat_core::{
  alert::{Alert, AlertStatus},
  briefing::SummaryMode,
  patrol::{NewPatrol, Patrol, PatrolPhase},
  store::{AlertQuery, DispatchStore},
  unit::{DEFAULT_ROLE, NewUnit, Position, Unit},
};

use crate::{
  encode::{
    RawAlert, RawPatrol, RawUnit, encode_dt, encode_metadata, encode_mode,
    encode_priority, encode_status, encode_uuid,
  },
  schema::SCHEMA,
  Result,
};

// ─── Row mappers ─────────────────────────────────────────────────────────────

fn unit_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawUnit> {
  Ok(RawUnit {
    unit_id:      row.get(0)?,
    name:         row.get(1)?,
    role:         row.get(2)?,
    last_lat:     row.get(3)?,
    last_lon:     row.get(4)?,
    last_seen_at: row.get(5)?,
  })
}

fn alert_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawAlert> {
  Ok(RawAlert {
    alert_id:         row.get(0)?,
    kind:             row.get(1)?,
    priority:         row.get(2)?,
    lat:              row.get(3)?,
    lon:              row.get(4)?,
    confidence:       row.get(5)?,
    status:           row.get(6)?,
    created_at:       row.get(7)?,
    resolved_at:      row.get(8)?,
    assigned_unit_id: row.get(9)?,
    metadata:         row.get(10)?,
  })
}

fn patrol_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawPatrol> {
  Ok(RawPatrol {
    patrol_id:      row.get(0)?,
    unit_id:        row.get(1)?,
    started_at:     row.get(2)?,
    start_lat:      row.get(3)?,
    start_lon:      row.get(4)?,
    location_text:  row.get(5)?,
    ended_at:       row.get(6)?,
    summary:        row.get(7)?,
    risk_score:     row.get(8)?,
    generated_with: row.get(9)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A dispatch record store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted, and all
/// writes are serialized through it.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── DispatchStore impl ──────────────────────────────────────────────────────

impl DispatchStore for SqliteStore {
  type Error = crate::Error;

  // ── Units ─────────────────────────────────────────────────────────────────

  async fn add_unit(&self, input: NewUnit) -> Result<Unit> {
    let unit = Unit {
      unit_id:       Uuid::new_v4(),
      name:          input.name,
      role:          input.role.unwrap_or_else(|| DEFAULT_ROLE.to_owned()),
      last_position: input.position,
      last_seen_at:  input.position.map(|_| Utc::now()),
    };

    let id_str   = encode_uuid(unit.unit_id);
    let name     = unit.name.clone();
    let role     = unit.role.clone();
    let lat      = unit.last_position.map(|p| p.lat);
    let lon      = unit.last_position.map(|p| p.lon);
    let seen_str = unit.last_seen_at.map(encode_dt);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO units (unit_id, name, role, last_lat, last_lon, last_seen_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, name, role, lat, lon, seen_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(unit)
  }

  async fn get_unit(&self, id: Uuid) -> Result<Option<Unit>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUnit> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT unit_id, name, role, last_lat, last_lon, last_seen_at
               FROM units WHERE unit_id = ?1",
              rusqlite::params![id_str],
              unit_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUnit::into_unit).transpose()
  }

  async fn list_units(&self) -> Result<Vec<Unit>> {
    let raws: Vec<RawUnit> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT unit_id, name, role, last_lat, last_lon, last_seen_at
           FROM units ORDER BY unit_id",
        )?;
        let rows = stmt
          .query_map([], unit_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUnit::into_unit).collect()
  }

  async fn update_unit_position(
    &self,
    id: Uuid,
    position: Position,
    seen_at: DateTime<Utc>,
  ) -> Result<Option<Unit>> {
    let id_str   = encode_uuid(id);
    let seen_str = encode_dt(seen_at);

    let raw: Option<RawUnit> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE units SET last_lat = ?2, last_lon = ?3, last_seen_at = ?4
           WHERE unit_id = ?1",
          rusqlite::params![id_str, position.lat, position.lon, seen_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(
          conn
            .query_row(
              "SELECT unit_id, name, role, last_lat, last_lon, last_seen_at
               FROM units WHERE unit_id = ?1",
              rusqlite::params![id_str],
              unit_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUnit::into_unit).transpose()
  }

  // ── Alerts ────────────────────────────────────────────────────────────────

  async fn record_alert(&self, alert: Alert) -> Result<Alert> {
    let id_str       = encode_uuid(alert.alert_id);
    let kind         = alert.kind.clone();
    let priority_str = encode_priority(alert.priority).to_owned();
    let lat          = alert.position.lat;
    let lon          = alert.position.lon;
    let confidence   = alert.confidence;
    let status_str   = encode_status(alert.status).to_owned();
    let created_str  = encode_dt(alert.created_at);
    let resolved_str = alert.resolved_at.map(encode_dt);
    let unit_str     = alert.assigned_unit_id.map(encode_uuid);
    let metadata_str = encode_metadata(&alert.metadata)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO alerts (
             alert_id, kind, priority, lat, lon, confidence,
             status, created_at, resolved_at, assigned_unit_id, metadata
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
          rusqlite::params![
            id_str,
            kind,
            priority_str,
            lat,
            lon,
            confidence,
            status_str,
            created_str,
            resolved_str,
            unit_str,
            metadata_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(alert)
  }

  async fn get_alert(&self, id: Uuid) -> Result<Option<Alert>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawAlert> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT alert_id, kind, priority, lat, lon, confidence,
                      status, created_at, resolved_at, assigned_unit_id, metadata
               FROM alerts WHERE alert_id = ?1",
              rusqlite::params![id_str],
              alert_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAlert::into_alert).transpose()
  }

  async fn set_alert_status(
    &self,
    id: Uuid,
    status: AlertStatus,
    resolved_at: Option<DateTime<Utc>>,
  ) -> Result<Option<Alert>> {
    let id_str       = encode_uuid(id);
    let status_str   = encode_status(status).to_owned();
    let resolved_str = resolved_at.map(encode_dt);

    let raw: Option<RawAlert> = self
      .conn
      .call(move |conn| {
        // COALESCE keeps an earlier resolution stamp when no new one is given.
        let changed = conn.execute(
          "UPDATE alerts SET status = ?2, resolved_at = COALESCE(?3, resolved_at)
           WHERE alert_id = ?1",
          rusqlite::params![id_str, status_str, resolved_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(
          conn
            .query_row(
              "SELECT alert_id, kind, priority, lat, lon, confidence,
                      status, created_at, resolved_at, assigned_unit_id, metadata
               FROM alerts WHERE alert_id = ?1",
              rusqlite::params![id_str],
              alert_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAlert::into_alert).transpose()
  }

  async fn list_alerts(&self, query: &AlertQuery) -> Result<Vec<Alert>> {
    let status_str   = query.status.map(encode_status).map(str::to_owned);
    let priority_str = query.priority.map(encode_priority).map(str::to_owned);
    let unit_str     = query.assigned_unit_id.map(encode_uuid);
    let limit_val    = query.effective_limit() as i64;

    let raws: Vec<RawAlert> = self
      .conn
      .call(move |conn| {
        // Build WHERE clause dynamically; parameter slots stay fixed.
        let mut conds: Vec<&'static str> = vec![];
        if status_str.is_some() {
          conds.push("status = ?1");
        }
        if priority_str.is_some() {
          conds.push("priority = ?2");
        }
        if unit_str.is_some() {
          conds.push("assigned_unit_id = ?3");
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let sql = format!(
          "SELECT alert_id, kind, priority, lat, lon, confidence,
                  status, created_at, resolved_at, assigned_unit_id, metadata
           FROM alerts
           {where_clause}
           ORDER BY created_at DESC
           LIMIT ?4"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              status_str.as_deref(),
              priority_str.as_deref(),
              unit_str.as_deref(),
              limit_val,
            ],
            alert_from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAlert::into_alert).collect()
  }

  async fn alerts_for_unit_between(
    &self,
    unit_id: Uuid,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
  ) -> Result<Vec<Alert>> {
    let unit_str = encode_uuid(unit_id);
    let from_str = encode_dt(from);
    let to_str   = encode_dt(to);

    let raws: Vec<RawAlert> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT alert_id, kind, priority, lat, lon, confidence,
                  status, created_at, resolved_at, assigned_unit_id, metadata
           FROM alerts
           WHERE assigned_unit_id = ?1 AND created_at >= ?2 AND created_at <= ?3
           ORDER BY created_at DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![unit_str, from_str, to_str], alert_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAlert::into_alert).collect()
  }

  // ── Patrols ───────────────────────────────────────────────────────────────

  async fn add_patrol(&self, input: NewPatrol) -> Result<Patrol> {
    let patrol = Patrol {
      patrol_id:      Uuid::new_v4(),
      unit_id:        input.unit_id,
      started_at:     Utc::now(),
      start_position: input.start_position,
      location_text:  input.location_text,
      phase:          PatrolPhase::Active,
    };

    let id_str      = encode_uuid(patrol.patrol_id);
    let unit_str    = encode_uuid(patrol.unit_id);
    let started_str = encode_dt(patrol.started_at);
    let lat         = patrol.start_position.map(|p| p.lat);
    let lon         = patrol.start_position.map(|p| p.lon);
    let location    = patrol.location_text.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO patrols (patrol_id, unit_id, started_at, start_lat, start_lon, location_text)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, unit_str, started_str, lat, lon, location],
        )?;
        Ok(())
      })
      .await?;

    Ok(patrol)
  }

  async fn get_patrol(&self, id: Uuid) -> Result<Option<Patrol>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawPatrol> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT patrol_id, unit_id, started_at, start_lat, start_lon,
                      location_text, ended_at, summary, risk_score, generated_with
               FROM patrols WHERE patrol_id = ?1",
              rusqlite::params![id_str],
              patrol_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPatrol::into_patrol).transpose()
  }

  async fn complete_patrol(
    &self,
    id: Uuid,
    ended_at: DateTime<Utc>,
    summary: String,
    risk_score: f64,
    generated_with: SummaryMode,
  ) -> Result<Option<Patrol>> {
    let id_str    = encode_uuid(id);
    let ended_str = encode_dt(ended_at);
    let mode_str  = encode_mode(generated_with).to_owned();

    let raw: Option<RawPatrol> = self
      .conn
      .call(move |conn| {
        // All four debrief columns land together, so the schema CHECK holds.
        let changed = conn.execute(
          "UPDATE patrols
           SET ended_at = ?2, summary = ?3, risk_score = ?4, generated_with = ?5
           WHERE patrol_id = ?1",
          rusqlite::params![id_str, ended_str, summary, risk_score, mode_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(
          conn
            .query_row(
              "SELECT patrol_id, unit_id, started_at, start_lat, start_lon,
                      location_text, ended_at, summary, risk_score, generated_with
               FROM patrols WHERE patrol_id = ?1",
              rusqlite::params![id_str],
              patrol_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPatrol::into_patrol).transpose()
  }
}
