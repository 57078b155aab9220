//! `beat` — operator CLI for the beat dispatch server.
//!
//! Every subcommand is a thin wrapper over one HTTP call; the server owns
//! all validation and state. Output is one line per record by default, or
//! raw pretty-printed JSON with `--json`.
//!
//! ```text
//! beat unit create "Unit A" --position 12.9716,77.5946
//! beat alert create gunshot --lat 12.9716 --lon 77.5946 --priority P2
//! beat patrol start <unit-id> --location "MG Road"
//! beat search "checkpoint staffing" --k 3
//! ```

mod client;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use beat_core::{
  alert::{Alert, AlertStatus, NewAlert, Priority},
  patrol::{NewPatrol, Patrol, PatrolPhase, PatrolSummary},
  unit::{NewUnit, Position, Unit},
};
use clap::{Parser, Subcommand};
use client::ApiClient;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use uuid::Uuid;

const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Sample standing-order document ingested by `beat seed`.
const DEMO_SOP: &str = "Standard operating procedure for nakabandi (vehicle checkpoint) duty. \
Select a site with clear sightlines and space to wave vehicles aside without blocking traffic. \
Staff the point with at least two officers, one checking documents while the other covers from a distance. \
Log every stopped vehicle in the duty register and escalate refusals to the control room rather than forcing a stop. \
Rotate checkpoint locations between shifts so patterns do not become predictable.";

// ─── Command line ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "beat", version, about = "Operator CLI for the beat dispatch server")]
struct Args {
  /// Base URL of the dispatch server.
  #[arg(long, value_name = "URL")]
  api_url: Option<String>,

  /// Path to a TOML config file. Defaults to `~/.config/beat/config.toml`.
  #[arg(long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Print raw JSON instead of formatted lines.
  #[arg(long)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Manage field units.
  #[command(subcommand)]
  Unit(UnitCommand),
  /// Raise and inspect alerts.
  #[command(subcommand)]
  Alert(AlertCommand),
  /// Drive the patrol lifecycle.
  #[command(subcommand)]
  Patrol(PatrolCommand),
  /// Manage indexed documents.
  #[command(subcommand)]
  Doc(DocCommand),
  /// Query the semantic index.
  Search {
    /// Free-text query.
    query: String,
    /// Number of passages to return.
    #[arg(long)]
    k:     Option<usize>,
  },
  /// Seed demo units and a sample SOP through the API.
  Seed,
  /// Check that the server is up.
  Health,
}

#[derive(Subcommand)]
enum UnitCommand {
  /// Register a unit.
  Create {
    name:     String,
    #[arg(long)]
    role:     Option<String>,
    /// Starting position as `lat,lon`.
    #[arg(long, value_name = "LAT,LON")]
    position: Option<String>,
  },
  /// List all units.
  List,
  /// Show one unit.
  Get { id: Uuid },
  /// Report a unit's position.
  Locate {
    id:       Uuid,
    /// Position as `lat,lon`.
    position: String,
  },
}

#[derive(Subcommand)]
enum AlertCommand {
  /// Raise an alert.
  Create {
    /// Alert kind, e.g. `gunshot` or `suspicious_vehicle`.
    kind:       String,
    #[arg(long, default_value = "P3")]
    priority:   String,
    #[arg(long)]
    lat:        f64,
    #[arg(long)]
    lon:        f64,
    /// Detector confidence within [0, 1].
    #[arg(long, default_value_t = 0.5)]
    confidence: f64,
  },
  /// List alerts, newest first.
  List {
    #[arg(long)]
    status:   Option<String>,
    #[arg(long)]
    priority: Option<String>,
    /// Only alerts assigned to this unit.
    #[arg(long)]
    unit:     Option<Uuid>,
    #[arg(long)]
    limit:    Option<usize>,
  },
  /// Show one alert.
  Get { id: Uuid },
  /// Update an alert's status (`open`, `ack`, `resolved`).
  Status { id: Uuid, status: String },
}

#[derive(Subcommand)]
enum PatrolCommand {
  /// Start a patrol shift for a unit.
  Start {
    unit_id:  Uuid,
    /// Free-text beat or area name.
    #[arg(long)]
    location: Option<String>,
    /// Starting position as `lat,lon`.
    #[arg(long, value_name = "LAT,LON")]
    position: Option<String>,
  },
  /// End a patrol and generate its debrief.
  End {
    id:    Uuid,
    /// Officer notes folded into the debrief.
    #[arg(long)]
    notes: Option<String>,
  },
  /// Fetch a completed patrol's debrief.
  Summary { id: Uuid },
}

#[derive(Subcommand)]
enum DocCommand {
  /// Ingest a document into the semantic index.
  Ingest {
    doc_id:   String,
    /// Inline document text.
    #[arg(long)]
    content:  Option<String>,
    /// Read document text from a file instead.
    #[arg(long, value_name = "FILE")]
    file:     Option<PathBuf>,
    #[arg(long, default_value = "SOP")]
    doc_type: String,
  },
}

// ─── Configuration ───────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Debug, Default, serde::Deserialize)]
struct ConfigFile {
  #[serde(default)]
  api_url: String,
}

/// Resolve the server base URL. Flags override the `BEAT_API_URL` variable,
/// which overrides the config file, which overrides the default.
fn resolve_base_url(args: &Args) -> Result<String> {
  if let Some(url) = &args.api_url {
    return Ok(url.clone());
  }
  if let Ok(url) = std::env::var("BEAT_API_URL")
    && !url.is_empty()
  {
    return Ok(url);
  }
  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    read_config(path)?
  } else if let Some(path) = default_config_path().filter(|p| p.exists()) {
    read_config(&path)?
  } else {
    ConfigFile::default()
  };
  if !file_cfg.api_url.is_empty() {
    return Ok(file_cfg.api_url);
  }
  Ok(DEFAULT_API_URL.to_string())
}

fn read_config(path: &std::path::Path) -> Result<ConfigFile> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading config file {}", path.display()))?;
  toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
}

fn default_config_path() -> Option<PathBuf> {
  std::env::var("HOME")
    .ok()
    .map(|home| PathBuf::from(home).join(".config/beat/config.toml"))
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  let client = ApiClient::new(resolve_base_url(&args)?)?;
  run(args.command, &client, args.json).await
}

async fn run(command: Command, client: &ApiClient, json: bool) -> Result<()> {
  match command {
    Command::Unit(cmd) => run_unit(cmd, client, json).await,
    Command::Alert(cmd) => run_alert(cmd, client, json).await,
    Command::Patrol(cmd) => run_patrol(cmd, client, json).await,
    Command::Doc(cmd) => run_doc(cmd, client, json).await,
    Command::Search { query, k } => {
      let found = client.search(&query, k).await?;
      emit(json, &found, |found| {
        for passage in &found.results {
          println!("[{:.3}] {}", passage.distance, passage.content);
        }
      })
    }
    Command::Seed => seed(client).await,
    Command::Health => {
      let body = client.health().await?;
      emit(json, &body, |body| {
        println!("{}", body["status"].as_str().unwrap_or("unknown"));
      })
    }
  }
}

// ─── Subcommand dispatch ─────────────────────────────────────────────────────

async fn run_unit(cmd: UnitCommand, client: &ApiClient, json: bool) -> Result<()> {
  match cmd {
    UnitCommand::Create { name, role, position } => {
      let position = position.as_deref().map(parse_position).transpose()?;
      let unit = client.create_unit(&NewUnit { name, role, position }).await?;
      emit(json, &unit, print_unit)
    }
    UnitCommand::List => {
      let units = client.list_units().await?;
      emit(json, &units, |units| {
        for unit in units {
          print_unit(unit);
        }
      })
    }
    UnitCommand::Get { id } => {
      let unit = client.get_unit(id).await?;
      emit(json, &unit, print_unit)
    }
    UnitCommand::Locate { id, position } => {
      let position = parse_position(&position)?;
      let unit = client.report_location(id, position).await?;
      emit(json, &unit, print_unit)
    }
  }
}

async fn run_alert(cmd: AlertCommand, client: &ApiClient, json: bool) -> Result<()> {
  match cmd {
    AlertCommand::Create { kind, priority, lat, lon, confidence } => {
      let priority: Priority = parse_enum("priority", &priority)?;
      let input = NewAlert {
        kind,
        priority,
        lat,
        lon,
        confidence,
        metadata: Map::new(),
      };
      let alert = client.create_alert(&input).await?;
      emit(json, &alert, print_alert)
    }
    AlertCommand::List { status, priority, unit, limit } => {
      let alerts = client
        .list_alerts(status.as_deref(), priority.as_deref(), unit, limit)
        .await?;
      emit(json, &alerts, |alerts| {
        for alert in alerts {
          print_alert(alert);
        }
      })
    }
    AlertCommand::Get { id } => {
      let alert = client.get_alert(id).await?;
      emit(json, &alert, print_alert)
    }
    AlertCommand::Status { id, status } => {
      let status: AlertStatus = parse_enum("status", &status)?;
      let alert = client.set_alert_status(id, status).await?;
      emit(json, &alert, print_alert)
    }
  }
}

async fn run_patrol(cmd: PatrolCommand, client: &ApiClient, json: bool) -> Result<()> {
  match cmd {
    PatrolCommand::Start { unit_id, location, position } => {
      let start_position = position.as_deref().map(parse_position).transpose()?;
      let input = NewPatrol {
        unit_id,
        start_position,
        location_text: location,
      };
      let patrol = client.start_patrol(&input).await?;
      emit(json, &patrol, print_patrol)
    }
    PatrolCommand::End { id, notes } => {
      let patrol = client.end_patrol(id, notes).await?;
      emit(json, &patrol, print_patrol)
    }
    PatrolCommand::Summary { id } => {
      let summary = client.patrol_summary(id).await?;
      emit(json, &summary, print_summary)
    }
  }
}

async fn run_doc(cmd: DocCommand, client: &ApiClient, json: bool) -> Result<()> {
  match cmd {
    DocCommand::Ingest { doc_id, content, file, doc_type } => {
      let content = match (content, file) {
        (Some(text), None) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
          .with_context(|| format!("reading {}", path.display()))?,
        (Some(_), Some(_)) => bail!("--content and --file are mutually exclusive"),
        (None, None) => bail!("provide --content or --file"),
      };
      let body = client
        .ingest_document(&doc_id, &content, &doc_type, Map::new())
        .await?;
      emit(json, &body, |_| println!("ingested {doc_id}"))
    }
  }
}

/// Drive the demo seed through the public API: two field units around the
/// MG Road beat plus one standing-order document. Safe to run repeatedly.
async fn seed(client: &ApiClient) -> Result<()> {
  let existing = client.list_units().await?;
  for (name, lat, lon) in [("Unit A", 12.9716, 77.5946), ("Unit B", 12.9750, 77.6000)] {
    if existing.iter().any(|u| u.name == name) {
      println!("unit {name} already present");
      continue;
    }
    let unit = client
      .create_unit(&NewUnit {
        name:     name.to_string(),
        role:     Some("field".to_string()),
        position: Some(Position::new(lat, lon)?),
      })
      .await?;
    println!("seeded unit {} ({})", unit.name, unit.unit_id);
  }
  let mut metadata = Map::new();
  metadata.insert("topic".to_string(), Value::String("nakabandi".to_string()));
  client
    .ingest_document("sop_nakabandi_1", DEMO_SOP, "SOP", metadata)
    .await?;
  println!("seeded SOP document sop_nakabandi_1");
  Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Print `value` as pretty JSON, or hand it to `render` for line output.
fn emit<T: Serialize>(as_json: bool, value: &T, render: impl FnOnce(&T)) -> Result<()> {
  if as_json {
    println!(
      "{}",
      serde_json::to_string_pretty(value).context("serialising output")?
    );
  } else {
    render(value);
  }
  Ok(())
}

/// Parse a wire-format enum value such as a priority or status, so typos
/// fail locally with the same wording the server would use.
fn parse_enum<T: DeserializeOwned>(what: &str, raw: &str) -> Result<T> {
  serde_json::from_value(Value::String(raw.to_string()))
    .with_context(|| format!("invalid {what}: {raw}"))
}

/// Parse `lat,lon` into a validated position.
fn parse_position(raw: &str) -> Result<Position> {
  let (lat, lon) = raw
    .split_once(',')
    .with_context(|| format!("expected LAT,LON, got {raw}"))?;
  let lat: f64 = lat.trim().parse().context("latitude is not a number")?;
  let lon: f64 = lon.trim().parse().context("longitude is not a number")?;
  Ok(Position::new(lat, lon)?)
}

// ─── Line output ─────────────────────────────────────────────────────────────

fn print_unit(unit: &Unit) {
  let position = match unit.last_position {
    Some(p) => format!("({:.4}, {:.4})", p.lat, p.lon),
    None => "(no position)".to_string(),
  };
  println!("{}  {}  {}  {}", unit.unit_id, unit.name, unit.role, position);
}

fn print_alert(alert: &Alert) {
  let assigned = alert
    .assigned_unit_id
    .map(|id| id.to_string())
    .unwrap_or_else(|| "unassigned".to_string());
  println!(
    "{}  {}  {}  {}  ({:.4}, {:.4})  {}",
    alert.alert_id,
    alert.priority,
    alert.kind,
    alert.status,
    alert.position.lat,
    alert.position.lon,
    assigned
  );
}

fn print_patrol(patrol: &Patrol) {
  match &patrol.phase {
    PatrolPhase::Active => {
      println!(
        "{}  active  unit {}  since {}",
        patrol.patrol_id, patrol.unit_id, patrol.started_at
      );
    }
    PatrolPhase::Completed { ended_at, risk_score, generated_with, .. } => {
      println!(
        "{}  completed  unit {}  ended {}  risk {:.2}  ({})",
        patrol.patrol_id, patrol.unit_id, ended_at, risk_score, generated_with
      );
    }
  }
}

fn print_summary(summary: &PatrolSummary) {
  println!(
    "patrol {}  unit {}  risk {:.2}  ({})",
    summary.patrol_id, summary.unit_id, summary.risk_score, summary.generated_with
  );
  println!("{}", summary.summary);
  if !summary.context.is_empty() {
    println!("context:");
    for passage in &summary.context {
      println!("- {passage}");
    }
  }
}
