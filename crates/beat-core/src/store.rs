//! The `DispatchStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `beat-store-sqlite`).
//! Higher layers (`beat-api`, the services in this crate) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  alert::{Alert, AlertStatus, Priority},
  briefing::SummaryMode,
  patrol::{NewPatrol, Patrol},
  unit::{NewUnit, Position, Unit},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Page size applied when [`AlertQuery::limit`] is absent.
pub const DEFAULT_ALERT_PAGE: usize = 100;
/// Hard cap on one page of alerts.
pub const MAX_ALERT_PAGE: usize = 500;

/// Parameters for [`DispatchStore::list_alerts`].
#[derive(Debug, Clone, Default)]
pub struct AlertQuery {
  pub status:           Option<AlertStatus>,
  pub priority:         Option<Priority>,
  pub assigned_unit_id: Option<Uuid>,
  pub limit:            Option<usize>,
}

impl AlertQuery {
  /// The page size after defaulting and clamping to `[1, MAX_ALERT_PAGE]`.
  pub fn effective_limit(&self) -> usize {
    self.limit.unwrap_or(DEFAULT_ALERT_PAGE).clamp(1, MAX_ALERT_PAGE)
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the authoritative dispatch record store.
///
/// Reads answer misses with `None`; errors are reserved for storage
/// failures. Writes are serialized by the backend, so two alerts racing for
/// the same nearest unit both complete.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait DispatchStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Units ─────────────────────────────────────────────────────────────

  /// Register a unit. The store issues the UUID and applies the role
  /// default.
  fn add_unit(
    &self,
    input: NewUnit,
  ) -> impl Future<Output = Result<Unit, Self::Error>> + Send + '_;

  /// Retrieve a unit by UUID. Returns `None` if not found.
  fn get_unit(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Unit>, Self::Error>> + Send + '_;

  /// List all units in stable unit-id order.
  fn list_units(
    &self,
  ) -> impl Future<Output = Result<Vec<Unit>, Self::Error>> + Send + '_;

  /// Apply an external location report. Returns `None` for an unknown
  /// unit.
  fn update_unit_position(
    &self,
    id: Uuid,
    position: Position,
    seen_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Unit>, Self::Error>> + Send + '_;

  // ── Alerts ────────────────────────────────────────────────────────────

  /// Persist a fully formed alert (assignment already decided) in one
  /// logical transaction.
  fn record_alert(
    &self,
    alert: Alert,
  ) -> impl Future<Output = Result<Alert, Self::Error>> + Send + '_;

  /// Retrieve an alert by UUID. Returns `None` if not found.
  fn get_alert(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Alert>, Self::Error>> + Send + '_;

  /// Update an alert's status. `Some(resolved_at)` stamps the resolution
  /// time; `None` leaves any existing stamp in place. Returns `None` for
  /// an unknown alert.
  fn set_alert_status(
    &self,
    id: Uuid,
    status: AlertStatus,
    resolved_at: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Option<Alert>, Self::Error>> + Send + '_;

  /// List alerts, newest first, filtered and clamped per the query.
  fn list_alerts<'a>(
    &'a self,
    query: &'a AlertQuery,
  ) -> impl Future<Output = Result<Vec<Alert>, Self::Error>> + Send + 'a;

  /// Alerts assigned to `unit_id` with `created_at` inside the inclusive
  /// window, newest first.
  fn alerts_for_unit_between(
    &self,
    unit_id: Uuid,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<Alert>, Self::Error>> + Send + '_;

  // ── Patrols ───────────────────────────────────────────────────────────

  /// Open a patrol. The store issues the UUID and start timestamp; the
  /// phase is `Active`.
  fn add_patrol(
    &self,
    input: NewPatrol,
  ) -> impl Future<Output = Result<Patrol, Self::Error>> + Send + '_;

  /// Retrieve a patrol by UUID. Returns `None` if not found.
  fn get_patrol(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Patrol>, Self::Error>> + Send + '_;

  /// Complete a patrol: end time, summary, risk score and mode land in one
  /// atomic update, overwriting any previous completion. Returns `None`
  /// for an unknown patrol.
  fn complete_patrol(
    &self,
    id: Uuid,
    ended_at: DateTime<Utc>,
    summary: String,
    risk_score: f64,
    generated_with: SummaryMode,
  ) -> impl Future<Output = Result<Option<Patrol>, Self::Error>> + Send + '_;
}
