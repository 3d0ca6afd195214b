//! Write-through JSON file store, the application's single source of truth
//! on disk. Decoding is lenient one record at a time: a stored vehicle or
//! event that no longer parses is skipped with a warning instead of aborting
//! the whole load, and an invalid first-registration date degrades to
//! "missing" rather than dropping the vehicle.

use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::domain::{EventId, FuelType, MaintenanceEvent, Vehicle, VehicleId};
use super::repository::{GarageRepository, RepositoryError};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct JsonStore {
    path: PathBuf,
    state: Mutex<GarageState>,
}

#[derive(Default)]
struct GarageState {
    vehicles: Vec<Vehicle>,
    events: Vec<MaintenanceEvent>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct GarageFile {
    #[serde(default)]
    vehicles: Vec<Value>,
    #[serde(default)]
    events: Vec<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredVehicle {
    id: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    plate: Option<String>,
    fuel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    first_registration: Option<String>,
    km: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    argus_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredEvent {
    id: String,
    vehicle_id: String,
    intervention: String,
    date: String,
    km: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    photo: Option<String>,
}

impl JsonStore {
    /// Opens the store at `path`, starting empty when the file does not
    /// exist yet. A file that is not valid JSON at the top level is a hard
    /// error; individual unreadable records are skipped.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(raw) => decode(&raw)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => GarageState::default(),
            Err(err) => return Err(RepositoryError::Unavailable(err.to_string())),
        };
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    fn state(&self) -> Result<MutexGuard<'_, GarageState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }

    fn persist(&self, state: &GarageState) -> Result<(), RepositoryError> {
        let file = GarageFile {
            vehicles: state
                .vehicles
                .iter()
                .map(|vehicle| to_value(&stored_vehicle(vehicle)))
                .collect::<Result<_, _>>()?,
            events: state
                .events
                .iter()
                .map(|event| to_value(&stored_event(event)))
                .collect::<Result<_, _>>()?,
        };
        let raw = serde_json::to_string_pretty(&file)
            .map_err(|err| RepositoryError::Unavailable(err.to_string()))?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|err| RepositoryError::Unavailable(err.to_string()))?;
            }
        }
        fs::write(&self.path, raw).map_err(|err| RepositoryError::Unavailable(err.to_string()))
    }
}

impl GarageRepository for JsonStore {
    fn vehicles(&self) -> Result<Vec<Vehicle>, RepositoryError> {
        Ok(self.state()?.vehicles.clone())
    }

    fn vehicle(&self, id: &VehicleId) -> Result<Option<Vehicle>, RepositoryError> {
        Ok(self
            .state()?
            .vehicles
            .iter()
            .find(|vehicle| vehicle.id == *id)
            .cloned())
    }

    fn insert_vehicle(&self, vehicle: Vehicle) -> Result<Vehicle, RepositoryError> {
        let mut state = self.state()?;
        if state.vehicles.iter().any(|known| known.id == vehicle.id) {
            return Err(RepositoryError::Conflict);
        }
        state.vehicles.push(vehicle.clone());
        self.persist(&state)?;
        Ok(vehicle)
    }

    fn update_vehicle(&self, vehicle: Vehicle) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let slot = state
            .vehicles
            .iter_mut()
            .find(|known| known.id == vehicle.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = vehicle;
        self.persist(&state)
    }

    fn delete_vehicle(&self, id: &VehicleId) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let before = state.vehicles.len();
        state.vehicles.retain(|vehicle| vehicle.id != *id);
        if state.vehicles.len() == before {
            return Err(RepositoryError::NotFound);
        }
        // Cascade: no event may outlive its vehicle.
        state.events.retain(|event| event.vehicle_id != *id);
        self.persist(&state)
    }

    fn events(&self) -> Result<Vec<MaintenanceEvent>, RepositoryError> {
        Ok(self.state()?.events.clone())
    }

    fn events_for(&self, id: &VehicleId) -> Result<Vec<MaintenanceEvent>, RepositoryError> {
        Ok(self
            .state()?
            .events
            .iter()
            .filter(|event| event.vehicle_id == *id)
            .cloned()
            .collect())
    }

    fn insert_event(&self, event: MaintenanceEvent) -> Result<MaintenanceEvent, RepositoryError> {
        let mut state = self.state()?;
        if state.events.iter().any(|known| known.id == event.id) {
            return Err(RepositoryError::Conflict);
        }
        state.events.push(event.clone());
        self.persist(&state)?;
        Ok(event)
    }

    fn delete_event(&self, id: &EventId) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let before = state.events.len();
        state.events.retain(|event| event.id != *id);
        if state.events.len() == before {
            return Err(RepositoryError::NotFound);
        }
        self.persist(&state)
    }
}

fn decode(raw: &str) -> Result<GarageState, RepositoryError> {
    let file: GarageFile = serde_json::from_str(raw)
        .map_err(|err| RepositoryError::Unavailable(format!("garage store unreadable: {err}")))?;

    let mut state = GarageState::default();
    for value in file.vehicles {
        match serde_json::from_value::<StoredVehicle>(value) {
            Ok(stored) => {
                if let Some(vehicle) = vehicle_from_stored(stored) {
                    state.vehicles.push(vehicle);
                }
            }
            Err(err) => warn!(%err, "skipping malformed vehicle record"),
        }
    }
    for value in file.events {
        match serde_json::from_value::<StoredEvent>(value) {
            Ok(stored) => {
                if let Some(event) = event_from_stored(stored) {
                    state.events.push(event);
                }
            }
            Err(err) => warn!(%err, "skipping malformed event record"),
        }
    }
    Ok(state)
}

fn vehicle_from_stored(stored: StoredVehicle) -> Option<Vehicle> {
    let fuel = match stored.fuel.parse::<FuelType>() {
        Ok(fuel) => fuel,
        Err(err) => {
            warn!(id = %stored.id, %err, "skipping vehicle with unknown fuel type");
            return None;
        }
    };
    let first_registration = stored
        .first_registration
        .as_deref()
        .and_then(|raw| parse_date(raw, &stored.id));
    Some(Vehicle {
        id: VehicleId(stored.id),
        name: stored.name,
        plate: stored.plate,
        fuel,
        first_registration,
        km: stored.km,
        argus_url: stored.argus_url,
    })
}

fn event_from_stored(stored: StoredEvent) -> Option<MaintenanceEvent> {
    let Some(date) = parse_date(&stored.date, &stored.id) else {
        warn!(id = %stored.id, "skipping event without a readable date");
        return None;
    };
    Some(MaintenanceEvent {
        id: EventId(stored.id),
        vehicle_id: VehicleId(stored.vehicle_id),
        intervention: stored.intervention,
        date,
        km: stored.km,
        cost: stored.cost,
        notes: stored.notes,
        photo: stored.photo,
    })
}

fn parse_date(raw: &str, record: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(err) => {
            warn!(record, value = raw, %err, "unreadable stored date");
            None
        }
    }
}

fn stored_vehicle(vehicle: &Vehicle) -> StoredVehicle {
    StoredVehicle {
        id: vehicle.id.0.clone(),
        name: vehicle.name.clone(),
        plate: vehicle.plate.clone(),
        fuel: vehicle.fuel.label().to_string(),
        first_registration: vehicle
            .first_registration
            .map(|date| date.format(DATE_FORMAT).to_string()),
        km: vehicle.km,
        argus_url: vehicle.argus_url.clone(),
    }
}

fn stored_event(event: &MaintenanceEvent) -> StoredEvent {
    StoredEvent {
        id: event.id.0.clone(),
        vehicle_id: event.vehicle_id.0.clone(),
        intervention: event.intervention.clone(),
        date: event.date.format(DATE_FORMAT).to_string(),
        km: event.km,
        cost: event.cost,
        notes: event.notes.clone(),
        photo: event.photo.clone(),
    }
}

fn to_value<T: Serialize>(record: &T) -> Result<Value, RepositoryError> {
    serde_json::to_value(record).map_err(|err| RepositoryError::Unavailable(err.to_string()))
}
