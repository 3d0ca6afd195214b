use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{EventId, MaintenanceEvent, Vehicle, VehicleId};
use super::schedule::Urgency;

/// Storage abstraction over vehicles and their event history, so the service
/// and scanner can be exercised against in-memory fakes.
pub trait GarageRepository: Send + Sync {
    fn vehicles(&self) -> Result<Vec<Vehicle>, RepositoryError>;
    fn vehicle(&self, id: &VehicleId) -> Result<Option<Vehicle>, RepositoryError>;
    fn insert_vehicle(&self, vehicle: Vehicle) -> Result<Vehicle, RepositoryError>;
    fn update_vehicle(&self, vehicle: Vehicle) -> Result<(), RepositoryError>;
    /// Removes the vehicle and every event referencing it. Implementations
    /// must leave no orphaned events behind.
    fn delete_vehicle(&self, id: &VehicleId) -> Result<(), RepositoryError>;
    fn events(&self) -> Result<Vec<MaintenanceEvent>, RepositoryError>;
    fn events_for(&self, id: &VehicleId) -> Result<Vec<MaintenanceEvent>, RepositoryError>;
    fn insert_event(&self, event: MaintenanceEvent) -> Result<MaintenanceEvent, RepositoryError>;
    fn delete_event(&self, id: &EventId) -> Result<(), RepositoryError>;
}

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Reminder payload handed to the sink once the cooldown allows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderAlert {
    pub vehicle_id: VehicleId,
    pub intervention: String,
    pub urgency: Urgency,
    pub title: String,
    pub body: String,
}

/// Outbound reminder hook (native notifications, e-mail, or just the log).
pub trait ReminderSink: Send + Sync {
    fn publish(&self, alert: ReminderAlert) -> Result<(), AlertError>;
}

/// Reminder dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("reminder transport unavailable: {0}")]
    Transport(String),
}

/// Per-(vehicle, intervention) cooldown timestamps. Owned by the reminder
/// collaborator; the status engine itself stays side-effect-free.
pub trait ReminderLedger: Send + Sync {
    fn last_notified(
        &self,
        vehicle: &VehicleId,
        intervention: &str,
    ) -> Result<Option<DateTime<Utc>>, RepositoryError>;
    fn mark_notified(
        &self,
        vehicle: &VehicleId,
        intervention: &str,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
}
