//! Handlers for `/alerts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST`  | `/alerts` | Body: [`NewAlert`]; assigns + notifies, returns 201 |
//! | `GET`   | `/alerts` | Optional `status`, `priority`, `assigned_unit_id`, `limit` |
//! | `GET`   | `/alerts/{id}` | 404 if not found |
//! | `PATCH` | `/alerts/{id}` | Body: `{"status":"ack"}` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use beat_core::{
  alert::{Alert, AlertStatus, NewAlert, Priority},
  briefing::GenerationBackend,
  retrieval::SemanticIndex,
  store::{AlertQuery, DispatchStore},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  error::{ApiError, Payload},
};

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /alerts` — body: [`NewAlert`]; returns 201 + the stored alert.
///
/// Assignment and the live notification happen inside the dispatch service;
/// the delivery outcome is logged, never surfaced.
pub async fn create<S, X, G>(
  State(state): State<AppState<S, X, G>>,
  Payload(body): Payload<NewAlert>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DispatchStore + 'static,
  X: SemanticIndex + 'static,
  G: GenerationBackend + 'static,
{
  let (alert, delivery) = state.dispatch.create_alert(body).await?;
  if let Some(delivery) = delivery {
    tracing::debug!(alert_id = %alert.alert_id, ?delivery, "dispatch notification offered");
  }
  Ok((StatusCode::CREATED, Json(alert)))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status:           Option<AlertStatus>,
  pub priority:         Option<Priority>,
  pub assigned_unit_id: Option<Uuid>,
  pub limit:            Option<usize>,
}

/// `GET /alerts[?status=...][&priority=...][&assigned_unit_id=...][&limit=...]`
pub async fn list<S, X, G>(
  State(state): State<AppState<S, X, G>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Alert>>, ApiError>
where
  S: DispatchStore + 'static,
  X: SemanticIndex + 'static,
  G: GenerationBackend + 'static,
{
  let query = AlertQuery {
    status:           params.status,
    priority:         params.priority,
    assigned_unit_id: params.assigned_unit_id,
    limit:            params.limit,
  };
  let alerts = state
    .store
    .list_alerts(&query)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(alerts))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /alerts/{id}`
pub async fn get_one<S, X, G>(
  State(state): State<AppState<S, X, G>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Alert>, ApiError>
where
  S: DispatchStore + 'static,
  X: SemanticIndex + 'static,
  G: GenerationBackend + 'static,
{
  let alert = state
    .store
    .get_alert(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("alert {id} not found")))?;
  Ok(Json(alert))
}

// ─── Update status ────────────────────────────────────────────────────────────

/// JSON body accepted by `PATCH /alerts/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub status: AlertStatus,
}

/// `PATCH /alerts/{id}` — body: `{"status":"ack"}`.
pub async fn set_status<S, X, G>(
  State(state): State<AppState<S, X, G>>,
  Path(id): Path<Uuid>,
  Payload(body): Payload<UpdateBody>,
) -> Result<Json<Alert>, ApiError>
where
  S: DispatchStore + 'static,
  X: SemanticIndex + 'static,
  G: GenerationBackend + 'static,
{
  let alert = state.dispatch.update_status(id, body.status).await?;
  Ok(Json(alert))
}
