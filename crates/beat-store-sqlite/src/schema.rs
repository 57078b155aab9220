//! SQL schema for the beat SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS units (
    unit_id      TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    role         TEXT NOT NULL DEFAULT 'officer',
    last_lat     REAL,            -- position columns move together
    last_lon     REAL,
    last_seen_at TEXT,            -- ISO 8601 UTC
    CHECK ((last_lat IS NULL) = (last_lon IS NULL))
);

CREATE TABLE IF NOT EXISTS alerts (
    alert_id         TEXT PRIMARY KEY,
    kind             TEXT NOT NULL,   -- category label, e.g. 'gunshot'
    priority         TEXT NOT NULL,   -- 'P1'..'P4'
    lat              REAL NOT NULL,
    lon              REAL NOT NULL,
    confidence       REAL NOT NULL,
    status           TEXT NOT NULL DEFAULT 'open',   -- 'open' | 'ack' | 'resolved'
    created_at       TEXT NOT NULL,   -- ISO 8601 UTC; server-assigned
    resolved_at      TEXT,
    assigned_unit_id TEXT REFERENCES units(unit_id),
    metadata         TEXT NOT NULL DEFAULT '{}'      -- JSON object
);

-- A patrol is either active (all four debrief columns NULL) or completed
-- (all four set). Half-completed rows are rejected here and again on decode.
CREATE TABLE IF NOT EXISTS patrols (
    patrol_id      TEXT PRIMARY KEY,
    unit_id        TEXT NOT NULL REFERENCES units(unit_id),
    started_at     TEXT NOT NULL,
    start_lat      REAL,
    start_lon      REAL,
    location_text  TEXT,
    ended_at       TEXT,
    summary        TEXT,
    risk_score     REAL,
    generated_with TEXT,             -- 'generated' | 'template'
    CHECK ((start_lat IS NULL) = (start_lon IS NULL)),
    CHECK ((ended_at IS NULL) = (summary IS NULL)
       AND (summary IS NULL) = (risk_score IS NULL)
       AND (risk_score IS NULL) = (generated_with IS NULL))
);

CREATE INDEX IF NOT EXISTS alerts_assigned_idx ON alerts(assigned_unit_id, created_at);
CREATE INDEX IF NOT EXISTS alerts_status_idx   ON alerts(status);
CREATE INDEX IF NOT EXISTS patrols_unit_idx    ON patrols(unit_id);

PRAGMA user_version = 1;
";
