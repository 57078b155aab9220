//! Alert intake: validation, nearest-unit assignment, persistence, and the
//! best-effort live notification.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
  alert::{Alert, AlertStatus, NewAlert, Priority},
  error::{Error, Result},
  geo,
  registry::{ConnectionRegistry, Delivery},
  store::DispatchStore,
};

// ─── Notification payload ────────────────────────────────────────────────────

/// Wire payload pushed on a unit's live channel when an alert is assigned.
///
/// Consumed by dashboards that predate this service; field names are frozen,
/// including the legacy `assigned_officer_id`.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchNotification {
  pub event: &'static str,
  pub alert: AlertPayload,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertPayload {
  pub id:                  Uuid,
  #[serde(rename = "type")]
  pub kind:                String,
  pub priority:            Priority,
  pub lat:                 f64,
  pub lon:                 f64,
  pub confidence:          f64,
  pub status:              AlertStatus,
  pub created_at:          DateTime<Utc>,
  pub assigned_officer_id: Option<Uuid>,
  pub metadata:            Map<String, Value>,
}

impl DispatchNotification {
  /// Payload announcing a freshly created alert.
  pub fn alert_created(alert: &Alert) -> Self {
    Self {
      event: "alert_created",
      alert: AlertPayload {
        id:                  alert.alert_id,
        kind:                alert.kind.clone(),
        priority:            alert.priority,
        lat:                 alert.position.lat,
        lon:                 alert.position.lon,
        confidence:          alert.confidence,
        status:              alert.status,
        created_at:          alert.created_at,
        assigned_officer_id: alert.assigned_unit_id,
        metadata:            alert.metadata.clone(),
      },
    }
  }
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// Intake service for new alerts and status updates.
pub struct AlertDispatchService<S> {
  store:            Arc<S>,
  registry:         Arc<ConnectionRegistry>,
  assign_radius_km: f64,
}

impl<S: DispatchStore> AlertDispatchService<S> {
  pub fn new(
    store: Arc<S>,
    registry: Arc<ConnectionRegistry>,
    assign_radius_km: f64,
  ) -> Self {
    Self { store, registry, assign_radius_km }
  }

  /// Persist a new alert, assigning the nearest in-range unit, and offer a
  /// notification on the assignee's live channel.
  ///
  /// The returned [`Delivery`] (`None` when no unit was assigned) reports
  /// the notification outcome. It never affects whether the alert exists.
  pub async fn create_alert(
    &self,
    input: NewAlert,
  ) -> Result<(Alert, Option<Delivery>)> {
    let position = input.validate()?;

    let units = self.store.list_units().await.map_err(Error::store)?;
    let assigned_unit_id = geo::nearest_unit(&units, position, self.assign_radius_km);

    let alert = Alert {
      alert_id: Uuid::new_v4(),
      kind: input.kind,
      priority: input.priority,
      position,
      confidence: input.confidence,
      status: AlertStatus::Open,
      created_at: Utc::now(),
      resolved_at: None,
      assigned_unit_id,
      metadata: input.metadata,
    };
    let alert = self.store.record_alert(alert).await.map_err(Error::store)?;

    let delivery = alert.assigned_unit_id.map(|unit_id| {
      let notification = DispatchNotification::alert_created(&alert);
      self.registry.send(unit_id, &notification)
    });
    Ok((alert, delivery))
  }

  /// Apply a status change.
  ///
  /// Transitions are permissive across the closed status set. Entering
  /// `Resolved` stamps the resolution time (re-resolving restamps it);
  /// leaving `Resolved` keeps the old stamp.
  pub async fn update_status(
    &self,
    alert_id: Uuid,
    status: AlertStatus,
  ) -> Result<Alert> {
    let resolved_at = (status == AlertStatus::Resolved).then(Utc::now);
    self
      .store
      .set_alert_status(alert_id, status, resolved_at)
      .await
      .map_err(Error::store)?
      .ok_or(Error::AlertNotFound(alert_id))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    store::AlertQuery,
    testing::{MemStore, RecordingSink},
    unit::{NewUnit, Position},
  };

  async fn seeded_store() -> (Arc<MemStore>, Uuid, Uuid) {
    let store = Arc::new(MemStore::default());
    let near = store
      .add_unit(NewUnit {
        name:     "alpha".into(),
        role:     None,
        position: Some(Position::new(12.9750, 77.6000).unwrap()),
      })
      .await
      .unwrap();
    let far = store
      .add_unit(NewUnit {
        name:     "bravo".into(),
        role:     None,
        position: Some(Position::new(13.0716, 77.5946).unwrap()),
      })
      .await
      .unwrap();
    (store, near.unit_id, far.unit_id)
  }

  fn gunshot(confidence: f64) -> NewAlert {
    NewAlert {
      kind:       "gunshot".into(),
      priority:   Priority::P1,
      lat:        12.9716,
      lon:        77.5946,
      confidence,
      metadata:   Map::new(),
    }
  }

  #[tokio::test]
  async fn create_assigns_the_nearest_in_range_unit() {
    let (store, near, _far) = seeded_store().await;
    let registry = Arc::new(ConnectionRegistry::new());
    let svc = AlertDispatchService::new(Arc::clone(&store), registry, 5.0);

    let (alert, delivery) = svc.create_alert(gunshot(0.9)).await.unwrap();
    assert_eq!(alert.assigned_unit_id, Some(near));
    assert_eq!(alert.status, AlertStatus::Open);
    // Assigned but nobody connected.
    assert_eq!(delivery, Some(Delivery::NotConnected));
  }

  #[tokio::test]
  async fn create_notifies_a_connected_assignee() {
    let (store, near, _far) = seeded_store().await;
    let registry = Arc::new(ConnectionRegistry::new());
    let sink = RecordingSink::new();
    registry.connect(near, sink.clone());
    let svc = AlertDispatchService::new(Arc::clone(&store), Arc::clone(&registry), 5.0);

    let (alert, delivery) = svc.create_alert(gunshot(0.9)).await.unwrap();
    assert_eq!(delivery, Some(Delivery::Delivered));
    let messages = sink.messages();
    assert_eq!(messages.len(), 1);
    let value: Value = serde_json::from_str(&messages[0]).unwrap();
    assert_eq!(value["event"], "alert_created");
    assert_eq!(value["alert"]["id"], alert.alert_id.to_string());
    assert_eq!(value["alert"]["type"], "gunshot");
    assert_eq!(value["alert"]["priority"], "P1");
  }

  #[tokio::test]
  async fn create_without_an_in_range_unit_still_persists() {
    let store = Arc::new(MemStore::default());
    store
      .add_unit(NewUnit {
        name:     "charlie".into(),
        role:     None,
        position: Some(Position::new(13.0716, 77.5946).unwrap()),
      })
      .await
      .unwrap();
    let registry = Arc::new(ConnectionRegistry::new());
    let svc = AlertDispatchService::new(Arc::clone(&store), registry, 5.0);

    let (alert, delivery) = svc.create_alert(gunshot(0.5)).await.unwrap();
    assert_eq!(alert.assigned_unit_id, None);
    assert_eq!(delivery, None);
    let stored = store.get_alert(alert.alert_id).await.unwrap().unwrap();
    assert_eq!(stored.assigned_unit_id, None);
  }

  #[tokio::test]
  async fn invalid_input_persists_nothing() {
    let (store, _near, _far) = seeded_store().await;
    let registry = Arc::new(ConnectionRegistry::new());
    let svc = AlertDispatchService::new(Arc::clone(&store), registry, 5.0);

    let err = svc.create_alert(gunshot(1.5)).await.unwrap_err();
    assert!(matches!(err, Error::InvalidConfidence(_)));
    let mut bad_coords = gunshot(0.9);
    bad_coords.lat = 123.0;
    let err = svc.create_alert(bad_coords).await.unwrap_err();
    assert!(matches!(err, Error::InvalidCoordinates { .. }));

    let listed = store.list_alerts(&AlertQuery::default()).await.unwrap();
    assert!(listed.is_empty());
  }

  #[tokio::test]
  async fn resolving_stamps_the_resolution_time() {
    let (store, _near, _far) = seeded_store().await;
    let registry = Arc::new(ConnectionRegistry::new());
    let svc = AlertDispatchService::new(Arc::clone(&store), registry, 5.0);
    let (alert, _) = svc.create_alert(gunshot(0.9)).await.unwrap();

    let acked = svc
      .update_status(alert.alert_id, AlertStatus::Acknowledged)
      .await
      .unwrap();
    assert_eq!(acked.status, AlertStatus::Acknowledged);
    assert_eq!(acked.resolved_at, None);

    let resolved = svc
      .update_status(alert.alert_id, AlertStatus::Resolved)
      .await
      .unwrap();
    assert_eq!(resolved.status, AlertStatus::Resolved);
    let first_stamp = resolved.resolved_at.unwrap();

    // Re-opening keeps the stamp; re-resolving moves it forward.
    let reopened = svc.update_status(alert.alert_id, AlertStatus::Open).await.unwrap();
    assert_eq!(reopened.resolved_at, Some(first_stamp));
    let resolved_again = svc
      .update_status(alert.alert_id, AlertStatus::Resolved)
      .await
      .unwrap();
    assert!(resolved_again.resolved_at.unwrap() >= first_stamp);
  }

  #[tokio::test]
  async fn updating_an_unknown_alert_is_not_found() {
    let store = Arc::new(MemStore::default());
    let registry = Arc::new(ConnectionRegistry::new());
    let svc = AlertDispatchService::new(store, registry, 5.0);
    let err = svc
      .update_status(Uuid::new_v4(), AlertStatus::Resolved)
      .await
      .unwrap_err();
    assert!(matches!(err, Error::AlertNotFound(_)));
  }
}
