//! beatd server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the
//! SQLite record store and an in-process semantic index, and serves the
//! dispatch API over HTTP.
//!
//! # Demo data
//!
//! ```
//! cargo run -p beat-api --bin beatd -- --seed-demo
//! ```
//!
//! registers two field units and one checkpoint SOP passage before
//! serving, so a fresh install has something to dispatch against.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use axum::http::HeaderValue;
use beat_api::{AppState, LlmConfig, ServerConfig};
use beat_core::{
  briefing::SummaryGenerator,
  registry::ConnectionRegistry,
  retrieval::{PassageDoc, SemanticIndex},
  store::DispatchStore,
  unit::{NewUnit, Position},
};
use beat_index::MemoryIndex;
use beat_llm::{ChatClient, ChatConfig};
use beat_store_sqlite::SqliteStore;
use clap::Parser;
use serde_json::{Map, Value};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Checkpoint SOP passage seeded with `--seed-demo`.
const DEMO_SOP: &str = "\
Nakabandi (vehicle checkpoint) standard operating procedure.
Select a site with clear sightlines and room to wave vehicles aside.
Staff every checkpoint with at least two officers, one covering.
Log every stopped vehicle; escalate refusals to the control room.
Rotate checkpoint locations between shifts to avoid predictability.";

#[derive(Parser)]
#[command(author, version, about = "Beat dispatch server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Seed demo units and a sample SOP document before serving.
  #[arg(long)]
  seed_demo: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration. `BEAT_LLM__MODEL` style variables override the file.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("BEAT")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` and make sure the database directory exists.
  let db_path = expand_tilde(&server_cfg.db_path);
  if let Some(dir) = db_path.parent()
    && !dir.as_os_str().is_empty()
  {
    std::fs::create_dir_all(dir)
      .with_context(|| format!("failed to create {dir:?}"))?;
  }

  let store = Arc::new(
    SqliteStore::open(&db_path)
      .await
      .with_context(|| format!("failed to open store at {db_path:?}"))?,
  );
  let index = Arc::new(MemoryIndex::new());
  let registry = Arc::new(ConnectionRegistry::new());

  if cli.seed_demo {
    seed_demo(store.as_ref(), index.as_ref())
      .await
      .context("seeding demo data")?;
  }

  let generator = summary_generator(&server_cfg.llm)?;
  let state = AppState::new(
    store,
    index,
    registry,
    generator,
    server_cfg.assign_radius_km,
  );

  let app =
    beat_api::router(state).layer(cors_layer(&server_cfg.cors_origins)?);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Template mode unless generation is enabled and a key is present.
fn summary_generator(
  cfg: &LlmConfig,
) -> anyhow::Result<SummaryGenerator<ChatClient>> {
  if !cfg.enabled {
    return Ok(SummaryGenerator::Template);
  }
  if cfg.api_key.is_empty() {
    tracing::warn!("llm enabled but no API key configured; debriefs stay in template mode");
    return Ok(SummaryGenerator::Template);
  }
  let client = ChatClient::new(ChatConfig {
    base_url: cfg.base_url.clone(),
    api_key:  cfg.api_key.clone(),
    model:    cfg.model.clone(),
    timeout:  Duration::from_secs(cfg.timeout_secs),
  })
  .context("failed to build chat client")?;
  tracing::info!(model = %cfg.model, "generated debriefs enabled");
  Ok(SummaryGenerator::Generated(Arc::new(client)))
}

/// Build the CORS layer from the configured origins; `*` opens it up.
fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
  let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
  if origins.iter().any(|o| o == "*") {
    return Ok(layer.allow_origin(Any));
  }
  let parsed = origins
    .iter()
    .map(|origin| origin.parse::<HeaderValue>())
    .collect::<Result<Vec<_>, _>>()
    .context("invalid CORS origin in configuration")?;
  Ok(layer.allow_origin(AllowOrigin::list(parsed)))
}

/// Two field units and one checkpoint SOP. Units already present by name
/// are left alone, so re-seeding an existing database is safe.
async fn seed_demo(store: &SqliteStore, index: &MemoryIndex) -> anyhow::Result<()> {
  let existing = store.list_units().await.context("listing units")?;

  for (name, lat, lon) in [("Unit A", 12.9716, 77.5946), ("Unit B", 12.9750, 77.6000)] {
    if existing.iter().any(|u| u.name == name) {
      continue;
    }
    let unit = store
      .add_unit(NewUnit {
        name:     name.to_string(),
        role:     Some("field".to_string()),
        position: Some(Position::new(lat, lon)?),
      })
      .await
      .with_context(|| format!("seeding {name}"))?;
    tracing::info!(name = %unit.name, unit_id = %unit.unit_id, "seeded unit");
  }

  let mut metadata = Map::new();
  metadata.insert("doc_type".to_string(), Value::String("SOP".to_string()));
  metadata.insert("topic".to_string(), Value::String("nakabandi".to_string()));
  index
    .ingest(PassageDoc {
      doc_id:   "sop_nakabandi_1".to_string(),
      content:  DEMO_SOP.to_string(),
      metadata,
    })
    .await
    .context("seeding SOP document")?;
  tracing::info!(doc_id = "sop_nakabandi_1", "seeded SOP document");

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
