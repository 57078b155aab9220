//! Handlers for `/units` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/units` | Body: [`NewUnit`]; returns 201 + stored unit |
//! | `GET`  | `/units` | All units, stable id order |
//! | `GET`  | `/units/{id}` | 404 if not found |
//! | `POST` | `/units/{id}/location` | Body: `{"lat":..,"lon":..}`; stamps `last_seen_at` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use beat_core::{
  briefing::GenerationBackend,
  retrieval::SemanticIndex,
  store::DispatchStore,
  unit::{NewUnit, Position, Unit},
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
  AppState,
  error::{ApiError, Payload},
};

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /units` — body: [`NewUnit`]; the role defaults to `officer`.
pub async fn create<S, X, G>(
  State(state): State<AppState<S, X, G>>,
  Payload(body): Payload<NewUnit>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DispatchStore + 'static,
  X: SemanticIndex + 'static,
  G: GenerationBackend + 'static,
{
  let unit = state
    .store
    .add_unit(body)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(unit)))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /units`
pub async fn list<S, X, G>(
  State(state): State<AppState<S, X, G>>,
) -> Result<Json<Vec<Unit>>, ApiError>
where
  S: DispatchStore + 'static,
  X: SemanticIndex + 'static,
  G: GenerationBackend + 'static,
{
  let units = state
    .store
    .list_units()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(units))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /units/{id}`
pub async fn get_one<S, X, G>(
  State(state): State<AppState<S, X, G>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Unit>, ApiError>
where
  S: DispatchStore + 'static,
  X: SemanticIndex + 'static,
  G: GenerationBackend + 'static,
{
  let unit = state
    .store
    .get_unit(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("unit {id} not found")))?;
  Ok(Json(unit))
}

// ─── Location report ──────────────────────────────────────────────────────────

/// `POST /units/{id}/location` — body: `{"lat":..,"lon":..}`.
///
/// The report time becomes the unit's `last_seen_at`.
pub async fn report_location<S, X, G>(
  State(state): State<AppState<S, X, G>>,
  Path(id): Path<Uuid>,
  Payload(position): Payload<Position>,
) -> Result<Json<Unit>, ApiError>
where
  S: DispatchStore + 'static,
  X: SemanticIndex + 'static,
  G: GenerationBackend + 'static,
{
  let unit = state
    .store
    .update_unit_position(id, position, Utc::now())
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("unit {id} not found")))?;
  Ok(Json(unit))
}
