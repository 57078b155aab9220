//! Handlers for document ingestion and retrieval queries.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/documents` | Body: `{doc_id, content, doc_type?, metadata?}` |
//! | `POST` | `/retrieval/query` | Body: `{query, k?, filter?}` |
//!
//! Both endpoints talk to the semantic index alone; failures surface as 502
//! because the record store is not involved.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use beat_core::{
  briefing::GenerationBackend,
  retrieval::{PassageDoc, RetrievedPassage, SemanticIndex},
  store::DispatchStore,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::{
  AppState,
  error::{ApiError, Payload},
};

/// `k` used when a retrieval query does not name one.
const DEFAULT_QUERY_K: usize = 4;

fn default_doc_type() -> String {
  "SOP".to_string()
}

// ─── Ingest ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /documents`.
#[derive(Debug, Deserialize)]
pub struct IngestBody {
  pub doc_id:   String,
  pub content:  String,
  #[serde(default = "default_doc_type")]
  pub doc_type: String,
  #[serde(default)]
  pub metadata: Map<String, Value>,
}

/// `POST /documents` — upserts one passage into the semantic index.
///
/// `doc_type` is folded into the stored metadata so queries can filter on it.
pub async fn ingest<S, X, G>(
  State(state): State<AppState<S, X, G>>,
  Payload(body): Payload<IngestBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DispatchStore + 'static,
  X: SemanticIndex + 'static,
  G: GenerationBackend + 'static,
{
  let mut metadata = body.metadata;
  metadata.insert("doc_type".to_string(), Value::String(body.doc_type));
  state
    .index
    .ingest(PassageDoc {
      doc_id: body.doc_id.clone(),
      content: body.content,
      metadata,
    })
    .await
    .map_err(|e| ApiError::Dependency(Box::new(e)))?;
  Ok((
    StatusCode::CREATED,
    Json(json!({ "status": "ingested", "doc_id": body.doc_id })),
  ))
}

// ─── Query ────────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /retrieval/query`.
#[derive(Debug, Deserialize)]
pub struct QueryBody {
  pub query:  String,
  pub k:      Option<usize>,
  #[serde(default)]
  pub filter: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
  pub query:   String,
  pub results: Vec<RetrievedPassage>,
}

/// `POST /retrieval/query` — ranks passages for an operator query.
pub async fn query<S, X, G>(
  State(state): State<AppState<S, X, G>>,
  Payload(body): Payload<QueryBody>,
) -> Result<Json<QueryResponse>, ApiError>
where
  S: DispatchStore + 'static,
  X: SemanticIndex + 'static,
  G: GenerationBackend + 'static,
{
  let k = body.k.unwrap_or(DEFAULT_QUERY_K);
  if k == 0 {
    return Err(beat_core::Error::InvalidResultCount.into());
  }
  let filter = (!body.filter.is_empty()).then_some(&body.filter);
  let results = state
    .index
    .query(&body.query, k, filter)
    .await
    .map_err(|e| ApiError::Dependency(Box::new(e)))?;
  Ok(Json(QueryResponse { query: body.query, results }))
}
