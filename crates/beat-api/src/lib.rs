//! JSON REST API and live notification endpoint for beat dispatch.
//!
//! Exposes an axum [`Router`] backed by any [`DispatchStore`] plus a
//! [`SemanticIndex`] and a [`GenerationBackend`] for the debrief pipeline.
//! TLS and transport concerns are the caller's responsibility; CORS is
//! layered on by the binary so the router stays test-friendly.

pub mod alerts;
pub mod documents;
pub mod error;
pub mod live;
pub mod patrols;
pub mod units;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Json, Router,
  routing::{get, post},
};
use beat_core::{
  briefing::{GenerationBackend, SummaryGenerator},
  dispatch::AlertDispatchService,
  patrol::PatrolLifecycleService,
  registry::ConnectionRegistry,
  retrieval::SemanticIndex,
  store::DispatchStore,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `BEAT_*` environment variables. Every field has a default, so an empty
/// config is a working single-node setup.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  #[serde(default = "default_db_path")]
  pub db_path:          PathBuf,
  #[serde(default = "default_assign_radius_km")]
  pub assign_radius_km: f64,
  #[serde(default = "default_cors_origins")]
  pub cors_origins:     Vec<String>,
  #[serde(default)]
  pub llm:              LlmConfig,
}

/// Text-generation backend settings. Generated debriefs require `enabled`
/// plus a non-empty key; anything less falls back to template mode.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
  #[serde(default)]
  pub enabled:      bool,
  #[serde(default = "default_llm_base_url")]
  pub base_url:     String,
  #[serde(default)]
  pub api_key:      String,
  #[serde(default = "default_llm_model")]
  pub model:        String,
  #[serde(default = "default_llm_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for LlmConfig {
  fn default() -> Self {
    Self {
      enabled:      false,
      base_url:     default_llm_base_url(),
      api_key:      String::new(),
      model:        default_llm_model(),
      timeout_secs: default_llm_timeout_secs(),
    }
  }
}

fn default_host() -> String {
  "127.0.0.1".to_string()
}

fn default_port() -> u16 {
  8000
}

fn default_db_path() -> PathBuf {
  PathBuf::from("./data/beat.db")
}

fn default_assign_radius_km() -> f64 {
  5.0
}

fn default_cors_origins() -> Vec<String> {
  vec!["http://localhost:3000".to_string()]
}

fn default_llm_base_url() -> String {
  "https://api.groq.com/openai/v1".to_string()
}

fn default_llm_model() -> String {
  "llama-3.1-8b-instant".to_string()
}

fn default_llm_timeout_secs() -> u64 {
  30
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, X, G> {
  pub store:    Arc<S>,
  pub index:    Arc<X>,
  pub registry: Arc<ConnectionRegistry>,
  pub dispatch: Arc<AlertDispatchService<S>>,
  pub patrols:  Arc<PatrolLifecycleService<S, X, G>>,
}

// Not derived: that would bound S, X, and G by Clone.
impl<S, X, G> Clone for AppState<S, X, G> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      index:    Arc::clone(&self.index),
      registry: Arc::clone(&self.registry),
      dispatch: Arc::clone(&self.dispatch),
      patrols:  Arc::clone(&self.patrols),
    }
  }
}

impl<S, X, G> AppState<S, X, G>
where
  S: DispatchStore + 'static,
  X: SemanticIndex + 'static,
  G: GenerationBackend + 'static,
{
  /// Wire up the services around the shared components.
  pub fn new(
    store: Arc<S>,
    index: Arc<X>,
    registry: Arc<ConnectionRegistry>,
    generator: SummaryGenerator<G>,
    assign_radius_km: f64,
  ) -> Self {
    let dispatch = Arc::new(AlertDispatchService::new(
      Arc::clone(&store),
      Arc::clone(&registry),
      assign_radius_km,
    ));
    let patrols = Arc::new(PatrolLifecycleService::new(
      Arc::clone(&store),
      Arc::clone(&index),
      generator,
    ));
    Self { store, index, registry, dispatch, patrols }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router: REST surface under `/api/v1`, the
/// live channel under `/ws`, and the health probe at the root.
pub fn router<S, X, G>(state: AppState<S, X, G>) -> Router
where
  S: DispatchStore + 'static,
  X: SemanticIndex + 'static,
  G: GenerationBackend + 'static,
{
  let api = Router::new()
    // Units
    .route("/units", get(units::list::<S, X, G>).post(units::create::<S, X, G>))
    .route("/units/{id}", get(units::get_one::<S, X, G>))
    .route("/units/{id}/location", post(units::report_location::<S, X, G>))
    // Alerts
    .route("/alerts", get(alerts::list::<S, X, G>).post(alerts::create::<S, X, G>))
    .route(
      "/alerts/{id}",
      get(alerts::get_one::<S, X, G>).patch(alerts::set_status::<S, X, G>),
    )
    // Patrols
    .route("/patrols", post(patrols::start::<S, X, G>))
    .route("/patrols/{id}", get(patrols::get_one::<S, X, G>))
    .route("/patrols/{id}/end", post(patrols::end::<S, X, G>))
    .route("/patrols/{id}/summary", get(patrols::summary::<S, X, G>))
    // Semantic index
    .route("/documents", post(documents::ingest::<S, X, G>))
    .route("/retrieval/query", post(documents::query::<S, X, G>));

  Router::new()
    .route("/health", get(health))
    .route("/ws/units/{unit_id}", get(live::attach::<S, X, G>))
    .nest("/api/v1", api)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// `GET /health` — liveness probe.
async fn health() -> Json<serde_json::Value> {
  Json(json!({ "status": "ok" }))
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use beat_index::MemoryIndex;
  use beat_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use super::*;

  /// Backend that answers every prompt with a fixed narrative.
  struct CannedBackend(&'static str);

  impl GenerationBackend for CannedBackend {
    type Error = std::convert::Infallible;

    async fn generate(
      &self,
      _system: &str,
      _prompt: &str,
    ) -> Result<String, Self::Error> {
      Ok(self.0.to_string())
    }
  }

  type TestState = AppState<SqliteStore, MemoryIndex, CannedBackend>;

  async fn state_with(generator: SummaryGenerator<CannedBackend>) -> TestState {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let index = Arc::new(MemoryIndex::new());
    let registry = Arc::new(ConnectionRegistry::new());
    AppState::new(store, index, registry, generator, 5.0)
  }

  async fn make_state() -> TestState {
    state_with(SummaryGenerator::Template).await
  }

  /// One request through the router; the body parses as JSON when present.
  async fn send(
    state: TestState,
    method: &str,
    uri: &str,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
      Some(value) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(value.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    let resp = router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  async fn register_unit(state: &TestState, name: &str, lat: f64, lon: f64) -> Uuid {
    let (status, body) = send(
      state.clone(),
      "POST",
      "/api/v1/units",
      Some(json!({ "name": name, "position": { "lat": lat, "lon": lon } })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "body: {body}");
    Uuid::parse_str(body["unit_id"].as_str().unwrap()).unwrap()
  }

  fn gunshot() -> Value {
    json!({
      "type": "gunshot",
      "priority": "P2",
      "lat": 12.9716,
      "lon": 77.5946,
      "confidence": 0.82,
    })
  }

  // ── Health ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn health_answers_ok() {
    let (status, body) = send(make_state().await, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
  }

  // ── Units ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn registering_a_unit_defaults_the_role() {
    let state = make_state().await;
    let (status, body) =
      send(state, "POST", "/api/v1/units", Some(json!({ "name": "Unit A" }))).await;
    assert_eq!(status, StatusCode::CREATED, "body: {body}");
    assert_eq!(body["role"], "officer");
    assert_eq!(body["last_position"], Value::Null);
  }

  #[tokio::test]
  async fn fetching_an_unknown_unit_is_not_found() {
    let state = make_state().await;
    let id = Uuid::new_v4();
    let (status, body) = send(state, "GET", &format!("/api/v1/units/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"), "body: {body}");
  }

  #[tokio::test]
  async fn unit_listing_is_in_stable_id_order() {
    let state = make_state().await;
    let a = register_unit(&state, "Unit A", 12.9716, 77.5946).await;
    let b = register_unit(&state, "Unit B", 12.9750, 77.6000).await;

    let (status, body) = send(state, "GET", "/api/v1/units", None).await;
    assert_eq!(status, StatusCode::OK);
    let mut expect = vec![a, b];
    expect.sort();
    let listed: Vec<Uuid> = body
      .as_array()
      .unwrap()
      .iter()
      .map(|u| Uuid::parse_str(u["unit_id"].as_str().unwrap()).unwrap())
      .collect();
    assert_eq!(listed, expect);
  }

  #[tokio::test]
  async fn location_reports_stamp_the_unit() {
    let state = make_state().await;
    let id = register_unit(&state, "Unit A", 12.9716, 77.5946).await;

    let (status, body) = send(
      state,
      "POST",
      &format!("/api/v1/units/{id}/location"),
      Some(json!({ "lat": 12.9800, "lon": 77.6100 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["last_position"]["lat"], 12.98);
    assert!(body["last_seen_at"].is_string(), "body: {body}");
  }

  #[tokio::test]
  async fn an_out_of_range_location_is_rejected() {
    let state = make_state().await;
    let id = register_unit(&state, "Unit A", 12.9716, 77.5946).await;

    let (status, body) = send(
      state,
      "POST",
      &format!("/api/v1/units/{id}/location"),
      Some(json!({ "lat": 123.0, "lon": 77.6100 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
    assert!(body["error"].as_str().unwrap().contains("coordinates"), "body: {body}");
  }

  #[tokio::test]
  async fn a_malformed_body_is_a_bad_request() {
    let state = make_state().await;
    let req = Request::builder()
      .method("POST")
      .uri("/api/v1/units")
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from("{not json"))
      .unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── Alerts ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn creating_an_alert_assigns_the_nearest_unit() {
    let state = make_state().await;
    let near = register_unit(&state, "Unit A", 12.9750, 77.6000).await;
    register_unit(&state, "Unit B", 13.0716, 77.5946).await;

    let (status, body) = send(state, "POST", "/api/v1/alerts", Some(gunshot())).await;
    assert_eq!(status, StatusCode::CREATED, "body: {body}");
    assert_eq!(body["type"], "gunshot");
    assert_eq!(body["status"], "open");
    assert_eq!(body["assigned_unit_id"], near.to_string());
  }

  #[tokio::test]
  async fn an_alert_with_no_unit_in_range_is_unassigned() {
    let state = make_state().await;
    register_unit(&state, "Unit B", 13.0716, 77.5946).await;

    let (status, body) = send(state, "POST", "/api/v1/alerts", Some(gunshot())).await;
    assert_eq!(status, StatusCode::CREATED, "body: {body}");
    assert_eq!(body["assigned_unit_id"], Value::Null);
  }

  #[tokio::test]
  async fn an_unknown_priority_is_rejected() {
    let state = make_state().await;
    let mut alert = gunshot();
    alert["priority"] = json!("P9");
    let (status, body) = send(state, "POST", "/api/v1/alerts", Some(alert)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
    assert!(body["error"].as_str().unwrap().contains("unknown variant"), "body: {body}");
  }

  #[tokio::test]
  async fn confidence_outside_the_unit_interval_is_rejected() {
    let state = make_state().await;
    let mut alert = gunshot();
    alert["confidence"] = json!(1.5);
    let (status, body) = send(state, "POST", "/api/v1/alerts", Some(alert)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
    assert!(body["error"].as_str().unwrap().contains("confidence"), "body: {body}");
  }

  #[tokio::test]
  async fn listing_filters_compose() {
    let state = make_state().await;
    let unit = register_unit(&state, "Unit A", 12.9750, 77.6000).await;

    let (_, first) = send(state.clone(), "POST", "/api/v1/alerts", Some(gunshot())).await;
    let mut urgent = gunshot();
    urgent["priority"] = json!("P1");
    let (_, second) = send(state.clone(), "POST", "/api/v1/alerts", Some(urgent)).await;

    let first_id = first["alert_id"].as_str().unwrap();
    send(
      state.clone(),
      "PATCH",
      &format!("/api/v1/alerts/{first_id}"),
      Some(json!({ "status": "ack" })),
    )
    .await;

    let (status, acked) = send(state.clone(), "GET", "/api/v1/alerts?status=ack", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(acked.as_array().unwrap().len(), 1);
    assert_eq!(acked[0]["alert_id"], first["alert_id"]);

    let (_, urgent_only) =
      send(state.clone(), "GET", "/api/v1/alerts?priority=P1", None).await;
    assert_eq!(urgent_only.as_array().unwrap().len(), 1);
    assert_eq!(urgent_only[0]["alert_id"], second["alert_id"]);

    let (_, assigned) = send(
      state.clone(),
      "GET",
      &format!("/api/v1/alerts?assigned_unit_id={unit}"),
      None,
    )
    .await;
    assert_eq!(assigned.as_array().unwrap().len(), 2);

    // Newest first, so a limit of one returns the later alert.
    let (_, latest) = send(state, "GET", "/api/v1/alerts?limit=1", None).await;
    assert_eq!(latest.as_array().unwrap().len(), 1);
    assert_eq!(latest[0]["alert_id"], second["alert_id"]);
  }

  #[tokio::test]
  async fn updating_status_stamps_resolution() {
    let state = make_state().await;
    register_unit(&state, "Unit A", 12.9750, 77.6000).await;
    let (_, alert) = send(state.clone(), "POST", "/api/v1/alerts", Some(gunshot())).await;
    let id = alert["alert_id"].as_str().unwrap();

    let (status, resolved) = send(
      state.clone(),
      "PATCH",
      &format!("/api/v1/alerts/{id}"),
      Some(json!({ "status": "resolved" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {resolved}");
    assert_eq!(resolved["status"], "resolved");
    assert!(resolved["resolved_at"].is_string(), "body: {resolved}");

    // Re-opening keeps the old stamp.
    let (_, reopened) = send(
      state,
      "PATCH",
      &format!("/api/v1/alerts/{id}"),
      Some(json!({ "status": "open" })),
    )
    .await;
    assert_eq!(reopened["status"], "open");
    assert_eq!(reopened["resolved_at"], resolved["resolved_at"]);
  }

  #[tokio::test]
  async fn patching_an_unknown_alert_is_not_found() {
    let state = make_state().await;
    let id = Uuid::new_v4();
    let (status, body) = send(
      state,
      "PATCH",
      &format!("/api/v1/alerts/{id}"),
      Some(json!({ "status": "ack" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "body: {body}");
  }

  #[tokio::test]
  async fn fetching_an_alert_round_trips() {
    let state = make_state().await;
    let mut alert = gunshot();
    alert["metadata"] = json!({ "sensor": "cam-3" });
    let (_, created) = send(state.clone(), "POST", "/api/v1/alerts", Some(alert)).await;
    let id = created["alert_id"].as_str().unwrap();

    let (status, fetched) = send(state, "GET", &format!("/api/v1/alerts/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["metadata"]["sensor"], "cam-3");
    assert_eq!(fetched["alert_id"], created["alert_id"]);
  }

  // ── Patrols ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn a_full_patrol_lifecycle_produces_a_debrief() {
    let state = make_state().await;
    let unit = register_unit(&state, "Unit A", 12.9750, 77.6000).await;

    let (status, patrol) = send(
      state.clone(),
      "POST",
      "/api/v1/patrols",
      Some(json!({ "unit_id": unit, "location_text": "MG Road" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "body: {patrol}");
    assert_eq!(patrol["phase"]["state"], "active");
    let id = patrol["patrol_id"].as_str().unwrap();

    // One P2 alert lands inside the shift window.
    send(state.clone(), "POST", "/api/v1/alerts", Some(gunshot())).await;

    let (status, ended) = send(
      state.clone(),
      "POST",
      &format!("/api/v1/patrols/{id}/end"),
      Some(json!({ "notes": "quiet shift" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {ended}");
    assert_eq!(ended["phase"]["state"], "completed");
    let narrative = ended["phase"]["summary"].as_str().unwrap();
    assert!(narrative.contains("Officer Notes: quiet shift"), "summary: {narrative}");
    assert!(narrative.contains("Key Alerts:"), "summary: {narrative}");
    assert_eq!(ended["phase"]["generated_with"], "template");
    let risk = ended["phase"]["risk_score"].as_f64().unwrap();
    assert!((risk - 0.14).abs() < 1e-9, "risk: {risk}");

    let (status, summary) =
      send(state, "GET", &format!("/api/v1/patrols/{id}/summary"), None).await;
    assert_eq!(status, StatusCode::OK, "body: {summary}");
    assert_eq!(summary["summary"], ended["phase"]["summary"]);
    assert_eq!(summary["generated_with"], "template");
  }

  #[tokio::test]
  async fn a_summary_before_the_end_is_precondition_failed() {
    let state = make_state().await;
    let unit = register_unit(&state, "Unit A", 12.9750, 77.6000).await;
    let (_, patrol) = send(
      state.clone(),
      "POST",
      "/api/v1/patrols",
      Some(json!({ "unit_id": unit })),
    )
    .await;
    let id = patrol["patrol_id"].as_str().unwrap();

    let (status, body) =
      send(state, "GET", &format!("/api/v1/patrols/{id}/summary"), None).await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED, "body: {body}");
    assert!(body["error"].as_str().unwrap().contains("not ended"), "body: {body}");
  }

  #[tokio::test]
  async fn starting_a_patrol_for_an_unknown_unit_is_not_found() {
    let state = make_state().await;
    let (status, body) = send(
      state,
      "POST",
      "/api/v1/patrols",
      Some(json!({ "unit_id": Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "body: {body}");
  }

  #[tokio::test]
  async fn ending_an_unknown_patrol_is_not_found() {
    let state = make_state().await;
    let id = Uuid::new_v4();
    let (status, body) = send(
      state,
      "POST",
      &format!("/api/v1/patrols/{id}/end"),
      Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "body: {body}");
  }

  #[tokio::test]
  async fn a_generated_debrief_reports_its_mode() {
    let canned = CannedBackend("All quiet across the beat.");
    let state = state_with(SummaryGenerator::Generated(Arc::new(canned))).await;
    let unit = register_unit(&state, "Unit A", 12.9750, 77.6000).await;
    let (_, patrol) = send(
      state.clone(),
      "POST",
      "/api/v1/patrols",
      Some(json!({ "unit_id": unit })),
    )
    .await;
    let id = patrol["patrol_id"].as_str().unwrap();

    let (status, ended) = send(
      state,
      "POST",
      &format!("/api/v1/patrols/{id}/end"),
      Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {ended}");
    assert_eq!(ended["phase"]["summary"], "All quiet across the beat.");
    assert_eq!(ended["phase"]["generated_with"], "generated");
  }

  // ── Semantic index ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn ingest_then_query_round_trip() {
    let state = make_state().await;
    let (status, body) = send(
      state.clone(),
      "POST",
      "/api/v1/documents",
      Some(json!({
        "doc_id": "sop-1",
        "content": "Checkpoint staffing requires two officers at night.",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "body: {body}");
    assert_eq!(body["status"], "ingested");
    assert_eq!(body["doc_id"], "sop-1");

    let (status, found) = send(
      state,
      "POST",
      "/api/v1/retrieval/query",
      Some(json!({ "query": "checkpoint staffing" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {found}");
    let results = found["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(
      results[0]["content"],
      "Checkpoint staffing requires two officers at night."
    );
    // The default document type is folded into the stored metadata.
    assert_eq!(results[0]["metadata"]["doc_type"], "SOP");
  }

  #[tokio::test]
  async fn a_zero_result_count_is_rejected() {
    let state = make_state().await;
    let (status, body) = send(
      state,
      "POST",
      "/api/v1/retrieval/query",
      Some(json!({ "query": "anything", "k": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
    assert!(body["error"].as_str().unwrap().contains("at least 1"), "body: {body}");
  }

  #[tokio::test]
  async fn query_filters_on_metadata() {
    let state = make_state().await;
    send(
      state.clone(),
      "POST",
      "/api/v1/documents",
      Some(json!({
        "doc_id": "sop-1",
        "content": "Nakabandi checkpoint procedure.",
      })),
    )
    .await;
    send(
      state.clone(),
      "POST",
      "/api/v1/documents",
      Some(json!({
        "doc_id": "log-1",
        "content": "Night patrol log for MG Road.",
        "doc_type": "log",
      })),
    )
    .await;

    let (status, found) = send(
      state,
      "POST",
      "/api/v1/retrieval/query",
      Some(json!({
        "query": "patrol",
        "filter": { "doc_type": "log" },
      })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {found}");
    let results = found["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["metadata"]["doc_type"], "log");
  }

  #[tokio::test]
  async fn a_summary_serves_fresh_retrieval_context() {
    let state = make_state().await;
    send(
      state.clone(),
      "POST",
      "/api/v1/documents",
      Some(json!({
        "doc_id": "sop-1",
        "content": "Hotspot coverage guidance for MG Road.",
      })),
    )
    .await;
    let unit = register_unit(&state, "Unit A", 12.9750, 77.6000).await;
    let (_, patrol) = send(
      state.clone(),
      "POST",
      "/api/v1/patrols",
      Some(json!({ "unit_id": unit, "location_text": "MG Road" })),
    )
    .await;
    let id = patrol["patrol_id"].as_str().unwrap();
    send(
      state.clone(),
      "POST",
      &format!("/api/v1/patrols/{id}/end"),
      Some(json!({})),
    )
    .await;

    let (status, summary) =
      send(state, "GET", &format!("/api/v1/patrols/{id}/summary"), None).await;
    assert_eq!(status, StatusCode::OK, "body: {summary}");
    assert_eq!(
      summary["context"],
      json!(["Hotspot coverage guidance for MG Road."])
    );
  }
}
