//! Geographic helpers for dispatch assignment.
//!
//! Distances use the haversine formula on a spherical Earth model, which is
//! accurate to well under a percent at beat scale.

use uuid::Uuid;

use crate::unit::{Position, Unit};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Assignment radius applied when the server config does not override it.
pub const DEFAULT_ASSIGN_RADIUS_KM: f64 = 5.0;

/// Great-circle distance between two positions, in kilometres.
pub fn haversine_km(a: Position, b: Position) -> f64 {
  let lat_a = a.lat.to_radians();
  let lat_b = b.lat.to_radians();
  let d_lat = (b.lat - a.lat).to_radians();
  let d_lon = (b.lon - a.lon).to_radians();

  let h = (d_lat / 2.0).sin().powi(2)
    + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
  2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Pick the unit nearest to `target` within `max_km`.
///
/// Units without a reported position are skipped. A later candidate wins
/// only by being strictly closer, so with a stable input order (the store
/// lists units by id) equidistant units resolve deterministically.
pub fn nearest_unit(units: &[Unit], target: Position, max_km: f64) -> Option<Uuid> {
  let mut best: Option<(Uuid, f64)> = None;
  for unit in units {
    let Some(pos) = unit.last_position else {
      continue;
    };
    let dist = haversine_km(pos, target);
    if dist > max_km {
      continue;
    }
    match best {
      Some((_, best_dist)) if dist >= best_dist => {}
      _ => best = Some((unit.unit_id, dist)),
    }
  }
  best.map(|(id, _)| id)
}
