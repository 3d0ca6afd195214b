//! Vehicle registry, maintenance history, and the due-status inference that
//! ties them together: catalog rules, urgency classification, reminders, and
//! the printable service record.

pub mod catalog;
pub mod domain;
pub(crate) mod format;
pub mod notify;
pub mod record;
pub mod repository;
pub mod router;
pub mod schedule;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use catalog::{MaintenanceRule, RuleCatalog, TECHNICAL_INSPECTION};
pub use domain::{EventId, FuelType, MaintenanceEvent, Vehicle, VehicleId};
pub use notify::{FileReminderLedger, ReminderScanner, ScanError, TracingReminderSink};
pub use record::MaintenanceRecord;
pub use repository::{
    AlertError, GarageRepository, ReminderAlert, ReminderLedger, ReminderSink, RepositoryError,
};
pub use router::garage_router;
pub use schedule::{MaintenanceStatus, SchedulePolicy, StatusEngine, Urgency};
pub use service::{EventDraft, GarageService, GarageServiceError, VehicleDraft};
pub use store::JsonStore;
