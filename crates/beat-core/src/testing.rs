//! In-memory doubles shared by the service and registry tests.

use std::sync::{
  Arc, Mutex,
  atomic::{AtomicBool, Ordering},
};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::{
  alert::{Alert, AlertStatus},
  briefing::{GenerationBackend, SummaryMode},
  patrol::{NewPatrol, Patrol, PatrolPhase},
  registry::{NotificationSink, SinkClosed},
  retrieval::{PassageDoc, RetrievedPassage, SemanticIndex},
  store::{AlertQuery, DispatchStore},
  unit::{DEFAULT_ROLE, NewUnit, Position, Unit},
};

/// Error type for fakes that cannot fail.
#[derive(Debug, Error)]
pub(crate) enum Never {}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Vec-backed `DispatchStore`.
#[derive(Default)]
pub(crate) struct MemStore {
  units:   Mutex<Vec<Unit>>,
  alerts:  Mutex<Vec<Alert>>,
  patrols: Mutex<Vec<Patrol>>,
}

impl DispatchStore for MemStore {
  type Error = Never;

  async fn add_unit(&self, input: NewUnit) -> Result<Unit, Never> {
    let unit = Unit {
      unit_id:       Uuid::new_v4(),
      name:          input.name,
      role:          input.role.unwrap_or_else(|| DEFAULT_ROLE.to_string()),
      last_position: input.position,
      last_seen_at:  input.position.map(|_| Utc::now()),
    };
    self.units.lock().unwrap().push(unit.clone());
    Ok(unit)
  }

  async fn get_unit(&self, id: Uuid) -> Result<Option<Unit>, Never> {
    Ok(self.units.lock().unwrap().iter().find(|u| u.unit_id == id).cloned())
  }

  async fn list_units(&self) -> Result<Vec<Unit>, Never> {
    let mut units = self.units.lock().unwrap().clone();
    units.sort_by_key(|u| u.unit_id);
    Ok(units)
  }

  async fn update_unit_position(
    &self,
    id: Uuid,
    position: Position,
    seen_at: DateTime<Utc>,
  ) -> Result<Option<Unit>, Never> {
    let mut units = self.units.lock().unwrap();
    let Some(unit) = units.iter_mut().find(|u| u.unit_id == id) else {
      return Ok(None);
    };
    unit.last_position = Some(position);
    unit.last_seen_at = Some(seen_at);
    Ok(Some(unit.clone()))
  }

  async fn record_alert(&self, alert: Alert) -> Result<Alert, Never> {
    self.alerts.lock().unwrap().push(alert.clone());
    Ok(alert)
  }

  async fn get_alert(&self, id: Uuid) -> Result<Option<Alert>, Never> {
    Ok(self.alerts.lock().unwrap().iter().find(|a| a.alert_id == id).cloned())
  }

  async fn set_alert_status(
    &self,
    id: Uuid,
    status: AlertStatus,
    resolved_at: Option<DateTime<Utc>>,
  ) -> Result<Option<Alert>, Never> {
    let mut alerts = self.alerts.lock().unwrap();
    let Some(alert) = alerts.iter_mut().find(|a| a.alert_id == id) else {
      return Ok(None);
    };
    alert.status = status;
    if let Some(stamp) = resolved_at {
      alert.resolved_at = Some(stamp);
    }
    Ok(Some(alert.clone()))
  }

  async fn list_alerts(&self, query: &AlertQuery) -> Result<Vec<Alert>, Never> {
    let mut alerts: Vec<Alert> = self
      .alerts
      .lock()
      .unwrap()
      .iter()
      .filter(|a| query.status.is_none_or(|s| a.status == s))
      .filter(|a| query.priority.is_none_or(|p| a.priority == p))
      .filter(|a| {
        query.assigned_unit_id.is_none_or(|u| a.assigned_unit_id == Some(u))
      })
      .cloned()
      .collect();
    alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    alerts.truncate(query.effective_limit());
    Ok(alerts)
  }

  async fn alerts_for_unit_between(
    &self,
    unit_id: Uuid,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
  ) -> Result<Vec<Alert>, Never> {
    let mut alerts: Vec<Alert> = self
      .alerts
      .lock()
      .unwrap()
      .iter()
      .filter(|a| a.assigned_unit_id == Some(unit_id))
      .filter(|a| a.created_at >= from && a.created_at <= to)
      .cloned()
      .collect();
    alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(alerts)
  }

  async fn add_patrol(&self, input: NewPatrol) -> Result<Patrol, Never> {
    let patrol = Patrol {
      patrol_id:      Uuid::new_v4(),
      unit_id:        input.unit_id,
      started_at:     Utc::now(),
      start_position: input.start_position,
      location_text:  input.location_text,
      phase:          PatrolPhase::Active,
    };
    self.patrols.lock().unwrap().push(patrol.clone());
    Ok(patrol)
  }

  async fn get_patrol(&self, id: Uuid) -> Result<Option<Patrol>, Never> {
    Ok(self.patrols.lock().unwrap().iter().find(|p| p.patrol_id == id).cloned())
  }

  async fn complete_patrol(
    &self,
    id: Uuid,
    ended_at: DateTime<Utc>,
    summary: String,
    risk_score: f64,
    generated_with: SummaryMode,
  ) -> Result<Option<Patrol>, Never> {
    let mut patrols = self.patrols.lock().unwrap();
    let Some(patrol) = patrols.iter_mut().find(|p| p.patrol_id == id) else {
      return Ok(None);
    };
    patrol.phase = PatrolPhase::Completed { ended_at, summary, risk_score, generated_with };
    Ok(Some(patrol.clone()))
  }
}

// ─── Sink ────────────────────────────────────────────────────────────────────

/// Sink that records every payload and can be flipped closed.
pub(crate) struct RecordingSink {
  open: AtomicBool,
  sent: Mutex<Vec<String>>,
}

impl RecordingSink {
  pub fn new() -> Arc<Self> {
    Arc::new(Self { open: AtomicBool::new(true), sent: Mutex::new(Vec::new()) })
  }

  pub fn close(&self) {
    self.open.store(false, Ordering::SeqCst);
  }

  pub fn messages(&self) -> Vec<String> {
    self.sent.lock().unwrap().clone()
  }
}

impl NotificationSink for RecordingSink {
  fn is_open(&self) -> bool {
    self.open.load(Ordering::SeqCst)
  }

  fn send_text(&self, text: String) -> Result<(), SinkClosed> {
    if !self.is_open() {
      return Err(SinkClosed);
    }
    self.sent.lock().unwrap().push(text);
    Ok(())
  }
}

// ─── Index ───────────────────────────────────────────────────────────────────

/// Index that returns fixed passages and records every query.
#[derive(Default)]
pub(crate) struct RecordingIndex {
  passages: Vec<String>,
  queries:  Mutex<Vec<(String, usize)>>,
}

impl RecordingIndex {
  pub fn with_passages(passages: Vec<String>) -> Self {
    Self { passages, queries: Mutex::new(Vec::new()) }
  }

  pub fn queries(&self) -> Vec<(String, usize)> {
    self.queries.lock().unwrap().clone()
  }
}

impl SemanticIndex for RecordingIndex {
  type Error = Never;

  async fn ingest(&self, _doc: PassageDoc) -> Result<(), Never> {
    Ok(())
  }

  async fn query(
    &self,
    text: &str,
    k: usize,
    _filter: Option<&Map<String, Value>>,
  ) -> Result<Vec<RetrievedPassage>, Never> {
    self.queries.lock().unwrap().push((text.to_string(), k));
    Ok(
      self
        .passages
        .iter()
        .take(k)
        .enumerate()
        .map(|(i, content)| RetrievedPassage {
          content:  content.clone(),
          metadata: Map::new(),
          distance: i as f32 * 0.1,
        })
        .collect(),
    )
  }
}

/// Index whose every call fails.
pub(crate) struct FailingIndex;

#[derive(Debug, Error)]
#[error("index offline")]
pub(crate) struct IndexDown;

impl SemanticIndex for FailingIndex {
  type Error = IndexDown;

  async fn ingest(&self, _doc: PassageDoc) -> Result<(), IndexDown> {
    Err(IndexDown)
  }

  async fn query(
    &self,
    _text: &str,
    _k: usize,
    _filter: Option<&Map<String, Value>>,
  ) -> Result<Vec<RetrievedPassage>, IndexDown> {
    Err(IndexDown)
  }
}

// ─── Backend ─────────────────────────────────────────────────────────────────

/// Backend that always answers with the same text.
pub(crate) struct FixedBackend(pub &'static str);

impl GenerationBackend for FixedBackend {
  type Error = Never;

  async fn generate(&self, _system: &str, _prompt: &str) -> Result<String, Never> {
    Ok(self.0.to_string())
  }
}

/// Backend that is always down.
pub(crate) struct FailingBackend;

#[derive(Debug, Error)]
#[error("backend offline")]
pub(crate) struct BackendDown;

impl GenerationBackend for FailingBackend {
  type Error = BackendDown;

  async fn generate(&self, _system: &str, _prompt: &str) -> Result<String, BackendDown> {
    Err(BackendDown)
  }
}
