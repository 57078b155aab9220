//! Patrol shifts and the lifecycle service that debriefs them.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  briefing::{self, GenerationBackend, SummaryGenerator, SummaryMode},
  error::{Error, Result},
  retrieval::SemanticIndex,
  store::DispatchStore,
  unit::Position,
};

/// Passages fetched for the end-of-shift narrative.
const END_CONTEXT_K: usize = 4;
/// Passages fetched when a stored summary is read back.
const SUMMARY_CONTEXT_K: usize = 3;

// ─── Types ───────────────────────────────────────────────────────────────────

/// Completion state of a patrol.
///
/// A completed patrol always carries its debrief. There is no representable
/// state with an end time but no summary, or a summary but no risk score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PatrolPhase {
  Active,
  Completed {
    ended_at:       DateTime<Utc>,
    summary:        String,
    risk_score:     f64,
    generated_with: SummaryMode,
  },
}

/// A patrol shift, from start through debrief.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patrol {
  pub patrol_id:      Uuid,
  pub unit_id:        Uuid,
  pub started_at:     DateTime<Utc>,
  pub start_position: Option<Position>,
  pub location_text:  Option<String>,
  pub phase:          PatrolPhase,
}

impl Patrol {
  pub fn is_active(&self) -> bool {
    matches!(self.phase, PatrolPhase::Active)
  }
}

/// Input for starting a patrol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatrol {
  pub unit_id:        Uuid,
  pub start_position: Option<Position>,
  pub location_text:  Option<String>,
}

/// Read model returned when a stored debrief is fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatrolSummary {
  pub patrol_id:      Uuid,
  pub unit_id:        Uuid,
  pub started_at:     DateTime<Utc>,
  pub ended_at:       DateTime<Utc>,
  pub summary:        String,
  pub risk_score:     f64,
  pub generated_with: SummaryMode,
  /// Fresh best-effort retrieval; empty when the index has nothing or is
  /// unavailable.
  pub context:        Vec<String>,
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// Orchestrates the patrol lifecycle: start, end-of-shift debrief, and
/// summary reads.
pub struct PatrolLifecycleService<S, X, G> {
  store:     Arc<S>,
  index:     Arc<X>,
  generator: SummaryGenerator<G>,
}

impl<S, X, G> PatrolLifecycleService<S, X, G>
where
  S: DispatchStore,
  X: SemanticIndex,
  G: GenerationBackend,
{
  pub fn new(store: Arc<S>, index: Arc<X>, generator: SummaryGenerator<G>) -> Self {
    Self { store, index, generator }
  }

  /// Open a patrol for an existing unit.
  pub async fn start(&self, input: NewPatrol) -> Result<Patrol> {
    self
      .store
      .get_unit(input.unit_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::UnitNotFound(input.unit_id))?;
    self.store.add_patrol(input).await.map_err(Error::store)
  }

  /// Close a patrol and persist its debrief in one atomic step.
  ///
  /// The whole pipeline runs before anything is written: alert collection,
  /// context retrieval, risk scoring, narrative generation. Any failure
  /// leaves the patrol untouched. Ending an already-completed patrol
  /// recomputes the debrief against a fresh end time and overwrites it.
  pub async fn end(&self, patrol_id: Uuid, notes: Option<String>) -> Result<Patrol> {
    let patrol = self
      .store
      .get_patrol(patrol_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::PatrolNotFound(patrol_id))?;
    let ended_at = Utc::now();

    let alerts = self
      .store
      .alerts_for_unit_between(patrol.unit_id, patrol.started_at, ended_at)
      .await
      .map_err(Error::store)?;

    let query = patrol
      .location_text
      .as_deref()
      .or(notes.as_deref())
      .unwrap_or("patrol summary");
    let passages = self
      .index
      .query(query, END_CONTEXT_K, None)
      .await
      .map_err(Error::retrieval)?;
    let context: Vec<String> = passages.into_iter().map(|p| p.content).collect();

    let risk_score = briefing::risk_score(&alerts);
    let debrief = self
      .generator
      .debrief(&patrol, &alerts, notes.as_deref(), &context)
      .await?;

    tracing::debug!(
      %patrol_id,
      alerts = alerts.len(),
      passages = context.len(),
      mode = %debrief.mode,
      "persisting patrol debrief"
    );
    self
      .store
      .complete_patrol(patrol_id, ended_at, debrief.narrative, risk_score, debrief.mode)
      .await
      .map_err(Error::store)?
      .ok_or(Error::PatrolNotFound(patrol_id))
  }

  /// Fetch the stored debrief plus a fresh round of context passages.
  ///
  /// Index trouble here degrades to an empty context list; the stored
  /// summary is authoritative and is returned regardless.
  pub async fn summary(&self, patrol_id: Uuid) -> Result<PatrolSummary> {
    let patrol = self
      .store
      .get_patrol(patrol_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::PatrolNotFound(patrol_id))?;
    let PatrolPhase::Completed { ended_at, summary, risk_score, generated_with } =
      patrol.phase
    else {
      return Err(Error::SummaryNotReady(patrol_id));
    };

    let query = patrol.location_text.as_deref().unwrap_or("patrol");
    let context = match self.index.query(query, SUMMARY_CONTEXT_K, None).await {
      Ok(passages) => passages.into_iter().map(|p| p.content).collect(),
      Err(err) => {
        tracing::warn!(%patrol_id, error = %err, "context retrieval failed; serving summary without context");
        Vec::new()
      }
    };

    Ok(PatrolSummary {
      patrol_id,
      unit_id: patrol.unit_id,
      started_at: patrol.started_at,
      ended_at,
      summary,
      risk_score,
      generated_with,
      context,
    })
  }
}
