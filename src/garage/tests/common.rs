use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::garage::domain::{EventId, FuelType, MaintenanceEvent, Vehicle, VehicleId};
use crate::garage::notify::ReminderScanner;
use crate::garage::repository::{
    AlertError, GarageRepository, ReminderAlert, ReminderLedger, ReminderSink, RepositoryError,
};
use crate::garage::router::garage_router;
use crate::garage::schedule::StatusEngine;
use crate::garage::service::{EventDraft, GarageService, VehicleDraft};

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn engine() -> StatusEngine {
    StatusEngine::standard()
}

pub(super) fn vehicle_with(
    fuel: FuelType,
    km: u32,
    first_registration: Option<NaiveDate>,
) -> Vehicle {
    Vehicle {
        id: VehicleId("veh-000001".to_string()),
        name: "Peugeot 208".to_string(),
        plate: Some("AB-123-CD".to_string()),
        fuel,
        first_registration,
        km,
        argus_url: None,
    }
}

pub(super) fn event(
    vehicle: &Vehicle,
    suffix: &str,
    intervention: &str,
    date: NaiveDate,
    km: u32,
) -> MaintenanceEvent {
    MaintenanceEvent {
        id: EventId(format!("evt-{suffix}")),
        vehicle_id: vehicle.id.clone(),
        intervention: intervention.to_string(),
        date,
        km,
        cost: None,
        notes: None,
        photo: None,
    }
}

pub(super) fn vehicle_draft(name: &str, fuel: FuelType, km: u32) -> VehicleDraft {
    VehicleDraft {
        name: name.to_string(),
        plate: None,
        fuel,
        first_registration: Some(date(2020, 6, 15)),
        km,
        argus_url: None,
    }
}

pub(super) fn event_draft(intervention: &str, on: NaiveDate, km: u32) -> EventDraft {
    EventDraft {
        intervention: intervention.to_string(),
        date: on,
        km,
        cost: None,
        notes: None,
        photo: None,
    }
}

pub(super) fn build_service() -> (GarageService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service =
        GarageService::new(repository.clone(), engine()).expect("service builds on empty store");
    (service, repository)
}

pub(super) fn build_scanner() -> (
    ReminderScanner<MemoryLedger, MemorySink>,
    Arc<MemoryLedger>,
    Arc<MemorySink>,
) {
    let ledger = Arc::new(MemoryLedger::default());
    let sink = Arc::new(MemorySink::default());
    let scanner = ReminderScanner::new(ledger.clone(), sink.clone());
    (scanner, ledger, sink)
}

pub(super) fn garage_router_with_service(
    service: GarageService<MemoryRepository>,
) -> axum::Router {
    garage_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 payload")
}

#[derive(Default)]
struct MemoryState {
    vehicles: Vec<Vehicle>,
    events: Vec<MaintenanceEvent>,
}

/// In-memory repository preserving insertion order, so tie-break and
/// cascade behavior can be observed directly.
#[derive(Default)]
pub(super) struct MemoryRepository {
    state: Mutex<MemoryState>,
}

impl GarageRepository for MemoryRepository {
    fn vehicles(&self) -> Result<Vec<Vehicle>, RepositoryError> {
        Ok(self.state.lock().expect("repository mutex poisoned").vehicles.clone())
    }

    fn vehicle(&self, id: &VehicleId) -> Result<Option<Vehicle>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state.vehicles.iter().find(|v| v.id == *id).cloned())
    }

    fn insert_vehicle(&self, vehicle: Vehicle) -> Result<Vehicle, RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        if state.vehicles.iter().any(|known| known.id == vehicle.id) {
            return Err(RepositoryError::Conflict);
        }
        state.vehicles.push(vehicle.clone());
        Ok(vehicle)
    }

    fn update_vehicle(&self, vehicle: Vehicle) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        let slot = state
            .vehicles
            .iter_mut()
            .find(|known| known.id == vehicle.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = vehicle;
        Ok(())
    }

    fn delete_vehicle(&self, id: &VehicleId) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        let before = state.vehicles.len();
        state.vehicles.retain(|vehicle| vehicle.id != *id);
        if state.vehicles.len() == before {
            return Err(RepositoryError::NotFound);
        }
        state.events.retain(|event| event.vehicle_id != *id);
        Ok(())
    }

    fn events(&self) -> Result<Vec<MaintenanceEvent>, RepositoryError> {
        Ok(self.state.lock().expect("repository mutex poisoned").events.clone())
    }

    fn events_for(&self, id: &VehicleId) -> Result<Vec<MaintenanceEvent>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state
            .events
            .iter()
            .filter(|event| event.vehicle_id == *id)
            .cloned()
            .collect())
    }

    fn insert_event(&self, event: MaintenanceEvent) -> Result<MaintenanceEvent, RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        if state.events.iter().any(|known| known.id == event.id) {
            return Err(RepositoryError::Conflict);
        }
        state.events.push(event.clone());
        Ok(event)
    }

    fn delete_event(&self, id: &EventId) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        let before = state.events.len();
        state.events.retain(|event| event.id != *id);
        if state.events.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct MemorySink {
    published: Mutex<Vec<ReminderAlert>>,
}

impl MemorySink {
    pub(super) fn alerts(&self) -> Vec<ReminderAlert> {
        self.published.lock().expect("sink mutex poisoned").clone()
    }
}

impl ReminderSink for MemorySink {
    fn publish(&self, alert: ReminderAlert) -> Result<(), AlertError> {
        self.published
            .lock()
            .expect("sink mutex poisoned")
            .push(alert);
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct MemoryLedger {
    entries: Mutex<HashMap<(String, String), DateTime<Utc>>>,
}

impl ReminderLedger for MemoryLedger {
    fn last_notified(
        &self,
        vehicle: &VehicleId,
        intervention: &str,
    ) -> Result<Option<DateTime<Utc>>, RepositoryError> {
        let entries = self.entries.lock().expect("ledger mutex poisoned");
        Ok(entries
            .get(&(vehicle.0.clone(), intervention.to_string()))
            .copied())
    }

    fn mark_notified(
        &self,
        vehicle: &VehicleId,
        intervention: &str,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut entries = self.entries.lock().expect("ledger mutex poisoned");
        entries.insert((vehicle.0.clone(), intervention.to_string()), at);
        Ok(())
    }
}
