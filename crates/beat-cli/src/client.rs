//! Async HTTP client wrapping the beat JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use beat_core::{
  alert::{Alert, AlertStatus, NewAlert},
  patrol::{NewPatrol, Patrol, PatrolSummary},
  retrieval::RetrievedPassage,
  unit::{NewUnit, Position, Unit},
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use uuid::Uuid;

/// Response shape of `POST /api/v1/retrieval/query`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
  pub query:   String,
  pub results: Vec<RetrievedPassage>,
}

/// Async HTTP client for the beat JSON REST API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client:   Client,
  base_url: String,
}

/// Build an error from a non-success response, surfacing the server's
/// `{"error": ...}` message when present.
async fn api_error(what: &str, resp: reqwest::Response) -> anyhow::Error {
  let status = resp.status();
  let message = resp
    .json::<Value>()
    .await
    .ok()
    .and_then(|body| body["error"].as_str().map(str::to_string));
  match message {
    Some(message) => anyhow!("{what} → {status}: {message}"),
    None => anyhow!("{what} → {status}"),
  }
}

impl ApiClient {
  pub fn new(base_url: String) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, base_url })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api/v1{}", self.base_url.trim_end_matches('/'), path)
  }

  // ── Units ─────────────────────────────────────────────────────────────────

  /// `POST /api/v1/units`
  pub async fn create_unit(&self, input: &NewUnit) -> Result<Unit> {
    let resp = self
      .client
      .post(self.url("/units"))
      .json(input)
      .send()
      .await
      .context("POST /units failed")?;
    if !resp.status().is_success() {
      return Err(api_error("POST /units", resp).await);
    }
    resp.json().await.context("deserialising unit")
  }

  /// `GET /api/v1/units`
  pub async fn list_units(&self) -> Result<Vec<Unit>> {
    let resp = self
      .client
      .get(self.url("/units"))
      .send()
      .await
      .context("GET /units failed")?;
    if !resp.status().is_success() {
      return Err(api_error("GET /units", resp).await);
    }
    resp.json().await.context("deserialising units")
  }

  /// `GET /api/v1/units/{id}`
  pub async fn get_unit(&self, id: Uuid) -> Result<Unit> {
    let resp = self
      .client
      .get(self.url(&format!("/units/{id}")))
      .send()
      .await
      .context("GET /units/{id} failed")?;
    if !resp.status().is_success() {
      return Err(api_error("GET /units/{id}", resp).await);
    }
    resp.json().await.context("deserialising unit")
  }

  /// `POST /api/v1/units/{id}/location`
  pub async fn report_location(&self, id: Uuid, position: Position) -> Result<Unit> {
    let resp = self
      .client
      .post(self.url(&format!("/units/{id}/location")))
      .json(&position)
      .send()
      .await
      .context("POST /units/{id}/location failed")?;
    if !resp.status().is_success() {
      return Err(api_error("POST /units/{id}/location", resp).await);
    }
    resp.json().await.context("deserialising unit")
  }

  // ── Alerts ────────────────────────────────────────────────────────────────

  /// `POST /api/v1/alerts`
  pub async fn create_alert(&self, input: &NewAlert) -> Result<Alert> {
    let resp = self
      .client
      .post(self.url("/alerts"))
      .json(input)
      .send()
      .await
      .context("POST /alerts failed")?;
    if !resp.status().is_success() {
      return Err(api_error("POST /alerts", resp).await);
    }
    resp.json().await.context("deserialising alert")
  }

  /// `GET /api/v1/alerts` with optional filters.
  pub async fn list_alerts(
    &self,
    status: Option<&str>,
    priority: Option<&str>,
    unit: Option<Uuid>,
    limit: Option<usize>,
  ) -> Result<Vec<Alert>> {
    let mut params: Vec<(&str, String)> = Vec::new();
    if let Some(status) = status {
      params.push(("status", status.to_string()));
    }
    if let Some(priority) = priority {
      params.push(("priority", priority.to_string()));
    }
    if let Some(unit) = unit {
      params.push(("assigned_unit_id", unit.to_string()));
    }
    if let Some(limit) = limit {
      params.push(("limit", limit.to_string()));
    }
    let resp = self
      .client
      .get(self.url("/alerts"))
      .query(&params)
      .send()
      .await
      .context("GET /alerts failed")?;
    if !resp.status().is_success() {
      return Err(api_error("GET /alerts", resp).await);
    }
    resp.json().await.context("deserialising alerts")
  }

  /// `GET /api/v1/alerts/{id}`
  pub async fn get_alert(&self, id: Uuid) -> Result<Alert> {
    let resp = self
      .client
      .get(self.url(&format!("/alerts/{id}")))
      .send()
      .await
      .context("GET /alerts/{id} failed")?;
    if !resp.status().is_success() {
      return Err(api_error("GET /alerts/{id}", resp).await);
    }
    resp.json().await.context("deserialising alert")
  }

  /// `PATCH /api/v1/alerts/{id}`
  pub async fn set_alert_status(&self, id: Uuid, status: AlertStatus) -> Result<Alert> {
    let resp = self
      .client
      .patch(self.url(&format!("/alerts/{id}")))
      .json(&json!({ "status": status }))
      .send()
      .await
      .context("PATCH /alerts/{id} failed")?;
    if !resp.status().is_success() {
      return Err(api_error("PATCH /alerts/{id}", resp).await);
    }
    resp.json().await.context("deserialising alert")
  }

  // ── Patrols ───────────────────────────────────────────────────────────────

  /// `POST /api/v1/patrols`
  pub async fn start_patrol(&self, input: &NewPatrol) -> Result<Patrol> {
    let resp = self
      .client
      .post(self.url("/patrols"))
      .json(input)
      .send()
      .await
      .context("POST /patrols failed")?;
    if !resp.status().is_success() {
      return Err(api_error("POST /patrols", resp).await);
    }
    resp.json().await.context("deserialising patrol")
  }

  /// `POST /api/v1/patrols/{id}/end`
  pub async fn end_patrol(&self, id: Uuid, notes: Option<String>) -> Result<Patrol> {
    let resp = self
      .client
      .post(self.url(&format!("/patrols/{id}/end")))
      .json(&json!({ "notes": notes }))
      .send()
      .await
      .context("POST /patrols/{id}/end failed")?;
    if !resp.status().is_success() {
      return Err(api_error("POST /patrols/{id}/end", resp).await);
    }
    resp.json().await.context("deserialising patrol")
  }

  /// `GET /api/v1/patrols/{id}/summary`
  pub async fn patrol_summary(&self, id: Uuid) -> Result<PatrolSummary> {
    let resp = self
      .client
      .get(self.url(&format!("/patrols/{id}/summary")))
      .send()
      .await
      .context("GET /patrols/{id}/summary failed")?;
    if !resp.status().is_success() {
      return Err(api_error("GET /patrols/{id}/summary", resp).await);
    }
    resp.json().await.context("deserialising patrol summary")
  }

  // ── Semantic index ────────────────────────────────────────────────────────

  /// `POST /api/v1/documents`
  pub async fn ingest_document(
    &self,
    doc_id: &str,
    content: &str,
    doc_type: &str,
    metadata: Map<String, Value>,
  ) -> Result<Value> {
    let body = json!({
      "doc_id": doc_id,
      "content": content,
      "doc_type": doc_type,
      "metadata": metadata,
    });
    let resp = self
      .client
      .post(self.url("/documents"))
      .json(&body)
      .send()
      .await
      .context("POST /documents failed")?;
    if !resp.status().is_success() {
      return Err(api_error("POST /documents", resp).await);
    }
    resp.json().await.context("deserialising ingest response")
  }

  /// `POST /api/v1/retrieval/query`
  pub async fn search(&self, query: &str, k: Option<usize>) -> Result<SearchResponse> {
    let mut body = json!({ "query": query });
    if let Some(k) = k {
      body["k"] = json!(k);
    }
    let resp = self
      .client
      .post(self.url("/retrieval/query"))
      .json(&body)
      .send()
      .await
      .context("POST /retrieval/query failed")?;
    if !resp.status().is_success() {
      return Err(api_error("POST /retrieval/query", resp).await);
    }
    resp.json().await.context("deserialising search response")
  }

  // ── Health ────────────────────────────────────────────────────────────────

  /// `GET /health`
  pub async fn health(&self) -> Result<Value> {
    let url = format!("{}/health", self.base_url.trim_end_matches('/'));
    let resp = self
      .client
      .get(url)
      .send()
      .await
      .context("GET /health failed")?;
    if !resp.status().is_success() {
      return Err(api_error("GET /health", resp).await);
    }
    resp.json().await.context("deserialising health response")
  }
}
