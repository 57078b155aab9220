//! Debrief assembly: risk scoring and narrative generation.
//!
//! The narrative has two producers. Generated mode asks an external text
//! backend and fails loudly when it cannot answer. Template mode renders a
//! fixed deterministic layout and cannot fail. The risk score is computed
//! independently of either and never touches the backend.

use std::{future::Future, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
  alert::Alert,
  error::{Error, Result},
  patrol::Patrol,
};

/// Normalisation divisor for the risk score.
const RISK_DIVISOR: f64 = 5.0;

/// Most alerts listed individually in a template narrative.
const NARRATIVE_ALERT_CAP: usize = 8;

/// System line sent ahead of every generated prompt.
pub const SYSTEM_PROMPT: &str =
  "You write operationally useful, non-hyped police summaries.";

// ─── Risk ────────────────────────────────────────────────────────────────────

/// Aggregate risk in [0, 1] for a set of alerts.
///
/// Sum of priority weights divided by [`RISK_DIVISOR`], capped at 1.0.
/// No alerts scores 0.0.
pub fn risk_score(alerts: &[Alert]) -> f64 {
  if alerts.is_empty() {
    return 0.0;
  }
  let total: f64 = alerts.iter().map(|a| a.priority.weight()).sum();
  (total / RISK_DIVISOR).min(1.0)
}

// ─── Narrative ───────────────────────────────────────────────────────────────

/// How a narrative was produced. Persisted alongside the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryMode {
  Generated,
  Template,
}

impl std::fmt::Display for SummaryMode {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(match self {
      Self::Generated => "generated",
      Self::Template => "template",
    })
  }
}

/// A produced narrative plus its provenance tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Debrief {
  pub narrative: String,
  pub mode:      SummaryMode,
}

fn alert_line(alert: &Alert) -> String {
  format!(
    "- {} {} ({}) @ ({:.4},{:.4})",
    alert.priority, alert.kind, alert.status, alert.position.lat, alert.position.lon
  )
}

/// Render the deterministic template narrative.
///
/// Identical inputs produce identical bytes; tests pin the exact layout.
pub fn template_narrative(
  alerts: &[Alert],
  notes: Option<&str>,
  passage_count: usize,
) -> String {
  let mut lines = Vec::new();
  lines.push("Executive Summary: Patrol completed; key alerts reviewed and logged.".to_string());
  if let Some(notes) = notes {
    lines.push(format!("Officer Notes: {notes}"));
  }
  if alerts.is_empty() {
    lines.push("Key Alerts: None recorded.".to_string());
  } else {
    lines.push("Key Alerts:".to_string());
    for alert in alerts.iter().take(NARRATIVE_ALERT_CAP) {
      lines.push(alert_line(alert));
    }
  }
  if passage_count > 0 {
    lines.push("SOP Context Used (RAG):".to_string());
    lines.push(format!("- Retrieved {passage_count} relevant SOP/log snippets."));
  }
  lines.push(
    "Recommendations: Increase monitoring at repeated hotspots; validate high-priority alerts quickly."
      .to_string(),
  );
  lines.join("\n")
}

/// Build the generated-mode user prompt.
pub fn build_prompt(
  patrol: &Patrol,
  alerts: &[Alert],
  notes: Option<&str>,
  passages: &[String],
) -> String {
  let mut prompt = String::new();
  prompt.push_str("You are an assistant for police operations.\n");
  prompt.push_str("Generate a concise end-of-shift patrol summary for the station commander.\n");
  prompt.push_str("\nPatrol:\n");
  prompt.push_str(&format!("id: {}\n", patrol.patrol_id));
  prompt.push_str(&format!("unit: {}\n", patrol.unit_id));
  prompt.push_str(&format!("started_at: {}\n", patrol.started_at.to_rfc3339()));
  if let Some(text) = &patrol.location_text {
    prompt.push_str(&format!("location: {text}\n"));
  }
  prompt.push_str("\nAlerts:\n");
  if alerts.is_empty() {
    prompt.push_str("None\n");
  } else {
    for alert in alerts {
      prompt.push_str(&alert_line(alert));
      prompt.push('\n');
    }
  }
  prompt.push_str("\nOfficer Notes:\n");
  prompt.push_str(notes.unwrap_or("None"));
  prompt.push('\n');
  prompt.push_str("\nRetrieved SOP/History context:\n");
  if passages.is_empty() {
    prompt.push_str("None\n");
  } else {
    for passage in passages {
      prompt.push_str(passage);
      prompt.push('\n');
    }
  }
  prompt.push_str("\nReturn:\n");
  prompt.push_str("1) Executive Summary (2-3 sentences)\n");
  prompt.push_str("2) Key Incidents (bullets)\n");
  prompt.push_str("3) Recommendations\n");
  prompt.push_str("4) Risk Indicators\n");
  prompt
}

// ─── Generation ──────────────────────────────────────────────────────────────

/// An external text-generation capability (chat-completion style).
///
/// Implementations bound their own latency; callers treat any error as the
/// backend being unavailable.
pub trait GenerationBackend: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Produce completion text for the given system line and user prompt.
  fn generate<'a>(
    &'a self,
    system: &'a str,
    prompt: &'a str,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;
}

/// Chooses between the generated and template narrative paths.
pub enum SummaryGenerator<G> {
  Generated(Arc<G>),
  Template,
}

impl<G: GenerationBackend> SummaryGenerator<G> {
  /// Produce the narrative for a closing patrol.
  pub async fn debrief(
    &self,
    patrol: &Patrol,
    alerts: &[Alert],
    notes: Option<&str>,
    passages: &[String],
  ) -> Result<Debrief> {
    match self {
      Self::Generated(backend) => {
        let prompt = build_prompt(patrol, alerts, notes, passages);
        let narrative = backend
          .generate(SYSTEM_PROMPT, &prompt)
          .await
          .map_err(Error::generation)?;
        Ok(Debrief { narrative, mode: SummaryMode::Generated })
      }
      Self::Template => Ok(Debrief {
        narrative: template_narrative(alerts, notes, passages.len()),
        mode:      SummaryMode::Template,
      }),
    }
  }
}
