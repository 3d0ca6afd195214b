use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{EventId, FuelType, MaintenanceEvent, Vehicle, VehicleId};
use super::record::MaintenanceRecord;
use super::repository::{GarageRepository, RepositoryError};
use super::schedule::{MaintenanceStatus, StatusEngine};

/// Service composing the repository and the status engine: vehicle registry,
/// event logging, and the derived views built from both.
pub struct GarageService<R> {
    repository: Arc<R>,
    engine: StatusEngine,
    vehicle_seq: AtomicU64,
    event_seq: AtomicU64,
}

/// Caller-supplied vehicle fields; the service assigns the identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleDraft {
    pub name: String,
    #[serde(default)]
    pub plate: Option<String>,
    pub fuel: FuelType,
    #[serde(default)]
    pub first_registration: Option<NaiveDate>,
    #[serde(default)]
    pub km: u32,
    #[serde(default)]
    pub argus_url: Option<String>,
}

/// Caller-supplied event fields; identifier and vehicle come from the call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub intervention: String,
    pub date: NaiveDate,
    pub km: u32,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
}

impl<R> GarageService<R>
where
    R: GarageRepository + 'static,
{
    /// Builds the service, seeding the id sequences past the highest
    /// persisted suffix so restarts keep issuing fresh identifiers.
    pub fn new(repository: Arc<R>, engine: StatusEngine) -> Result<Self, GarageServiceError> {
        let vehicle_seq = next_in_sequence(repository.vehicles()?.iter().map(|v| v.id.0.as_str()));
        let event_seq = next_in_sequence(repository.events()?.iter().map(|e| e.id.0.as_str()));
        Ok(Self {
            repository,
            engine,
            vehicle_seq: AtomicU64::new(vehicle_seq),
            event_seq: AtomicU64::new(event_seq),
        })
    }

    pub fn engine(&self) -> &StatusEngine {
        &self.engine
    }

    pub fn register_vehicle(&self, draft: VehicleDraft) -> Result<Vehicle, GarageServiceError> {
        if draft.name.trim().is_empty() {
            return Err(GarageServiceError::EmptyName);
        }
        let id = self.vehicle_seq.fetch_add(1, Ordering::Relaxed);
        let vehicle = Vehicle {
            id: VehicleId(format!("veh-{id:06}")),
            name: draft.name,
            plate: draft.plate,
            fuel: draft.fuel,
            first_registration: draft.first_registration,
            km: draft.km,
            argus_url: draft.argus_url,
        };
        Ok(self.repository.insert_vehicle(vehicle)?)
    }

    pub fn update_vehicle(
        &self,
        id: &VehicleId,
        draft: VehicleDraft,
    ) -> Result<Vehicle, GarageServiceError> {
        if draft.name.trim().is_empty() {
            return Err(GarageServiceError::EmptyName);
        }
        self.repository
            .vehicle(id)?
            .ok_or(RepositoryError::NotFound)?;
        let vehicle = Vehicle {
            id: id.clone(),
            name: draft.name,
            plate: draft.plate,
            fuel: draft.fuel,
            first_registration: draft.first_registration,
            km: draft.km,
            argus_url: draft.argus_url,
        };
        self.repository.update_vehicle(vehicle.clone())?;
        Ok(vehicle)
    }

    /// Removes the vehicle and, through the repository contract, every event
    /// it owns.
    pub fn delete_vehicle(&self, id: &VehicleId) -> Result<(), GarageServiceError> {
        Ok(self.repository.delete_vehicle(id)?)
    }

    pub fn vehicles(&self) -> Result<Vec<Vehicle>, GarageServiceError> {
        Ok(self.repository.vehicles()?)
    }

    pub fn vehicle(&self, id: &VehicleId) -> Result<Vehicle, GarageServiceError> {
        Ok(self
            .repository
            .vehicle(id)?
            .ok_or(RepositoryError::NotFound)?)
    }

    /// Logs a service event. When the event carries a higher odometer
    /// reading than the vehicle, the vehicle's odometer catches up.
    pub fn log_event(
        &self,
        vehicle_id: &VehicleId,
        draft: EventDraft,
    ) -> Result<MaintenanceEvent, GarageServiceError> {
        if draft.intervention.trim().is_empty() {
            return Err(GarageServiceError::EmptyIntervention);
        }
        let mut vehicle = self
            .repository
            .vehicle(vehicle_id)?
            .ok_or(RepositoryError::NotFound)?;

        let id = self.event_seq.fetch_add(1, Ordering::Relaxed);
        let event = MaintenanceEvent {
            id: EventId(format!("evt-{id:06}")),
            vehicle_id: vehicle_id.clone(),
            intervention: draft.intervention,
            date: draft.date,
            km: draft.km,
            cost: draft.cost,
            notes: draft.notes,
            photo: draft.photo,
        };
        let stored = self.repository.insert_event(event)?;

        if stored.km > vehicle.km {
            vehicle.km = stored.km;
            self.repository.update_vehicle(vehicle)?;
        }

        Ok(stored)
    }

    pub fn delete_event(&self, id: &EventId) -> Result<(), GarageServiceError> {
        Ok(self.repository.delete_event(id)?)
    }

    /// The vehicle's full history, newest first.
    pub fn history(&self, vehicle_id: &VehicleId) -> Result<Vec<MaintenanceEvent>, GarageServiceError> {
        self.repository
            .vehicle(vehicle_id)?
            .ok_or(RepositoryError::NotFound)?;
        let mut events = self.repository.events_for(vehicle_id)?;
        events.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(events)
    }

    /// Ranked maintenance statuses for one vehicle as of `today`.
    pub fn statuses(
        &self,
        vehicle_id: &VehicleId,
        today: NaiveDate,
    ) -> Result<Vec<MaintenanceStatus>, GarageServiceError> {
        let vehicle = self
            .repository
            .vehicle(vehicle_id)?
            .ok_or(RepositoryError::NotFound)?;
        let events = self.repository.events_for(vehicle_id)?;
        Ok(self.engine.statuses(&vehicle, &events, today))
    }

    /// The printable service record: vehicle header plus raw history.
    pub fn record(&self, vehicle_id: &VehicleId) -> Result<MaintenanceRecord, GarageServiceError> {
        let vehicle = self
            .repository
            .vehicle(vehicle_id)?
            .ok_or(RepositoryError::NotFound)?;
        let events = self.repository.events_for(vehicle_id)?;
        Ok(MaintenanceRecord::new(vehicle, events))
    }

    /// Catalog vocabulary for manual intervention selection.
    pub fn intervention_types(&self) -> Vec<String> {
        self.engine.catalog().intervention_types()
    }
}

fn next_in_sequence<'a>(ids: impl Iterator<Item = &'a str>) -> u64 {
    ids.filter_map(|id| id.rsplit('-').next()?.parse::<u64>().ok())
        .max()
        .map_or(1, |highest| highest + 1)
}

/// Error raised by the garage service.
#[derive(Debug, thiserror::Error)]
pub enum GarageServiceError {
    #[error("vehicle name is required")]
    EmptyName,
    #[error("intervention type is required")]
    EmptyIntervention,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
