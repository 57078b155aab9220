//! Handlers for `/patrols` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/patrols` | Body: [`NewPatrol`]; returns 201 |
//! | `GET`  | `/patrols/{id}` | 404 if not found |
//! | `POST` | `/patrols/{id}/end` | Body: `{"notes": "..."}`, notes optional |
//! | `GET`  | `/patrols/{id}/summary` | 412 until the patrol has ended |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use beat_core::{
  briefing::GenerationBackend,
  patrol::{NewPatrol, Patrol, PatrolSummary},
  retrieval::SemanticIndex,
  store::DispatchStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  error::{ApiError, Payload},
};

// ─── Start ────────────────────────────────────────────────────────────────────

/// `POST /patrols` — body: [`NewPatrol`]; returns 201 + the active patrol.
pub async fn start<S, X, G>(
  State(state): State<AppState<S, X, G>>,
  Payload(body): Payload<NewPatrol>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DispatchStore + 'static,
  X: SemanticIndex + 'static,
  G: GenerationBackend + 'static,
{
  let patrol = state.patrols.start(body).await?;
  Ok((StatusCode::CREATED, Json(patrol)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /patrols/{id}`
pub async fn get_one<S, X, G>(
  State(state): State<AppState<S, X, G>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Patrol>, ApiError>
where
  S: DispatchStore + 'static,
  X: SemanticIndex + 'static,
  G: GenerationBackend + 'static,
{
  let patrol = state
    .store
    .get_patrol(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("patrol {id} not found")))?;
  Ok(Json(patrol))
}

// ─── End ──────────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /patrols/{id}/end`.
#[derive(Debug, Deserialize)]
pub struct EndBody {
  pub notes: Option<String>,
}

/// `POST /patrols/{id}/end` — closes the patrol and generates its debrief.
pub async fn end<S, X, G>(
  State(state): State<AppState<S, X, G>>,
  Path(id): Path<Uuid>,
  Payload(body): Payload<EndBody>,
) -> Result<Json<Patrol>, ApiError>
where
  S: DispatchStore + 'static,
  X: SemanticIndex + 'static,
  G: GenerationBackend + 'static,
{
  let patrol = state.patrols.end(id, body.notes).await?;
  Ok(Json(patrol))
}

// ─── Summary ──────────────────────────────────────────────────────────────────

/// `GET /patrols/{id}/summary` — the stored debrief plus fresh retrieval
/// context.
pub async fn summary<S, X, G>(
  State(state): State<AppState<S, X, G>>,
  Path(id): Path<Uuid>,
) -> Result<Json<PatrolSummary>, ApiError>
where
  S: DispatchStore + 'static,
  X: SemanticIndex + 'static,
  G: GenerationBackend + 'static,
{
  let summary = state.patrols.summary(id).await?;
  Ok(Json(summary))
}
