//! Reminder scan: re-runs the status engine for every stored vehicle and
//! dispatches an alert for each due item, suppressed by a per-(vehicle,
//! intervention) cooldown so recomputation cycles do not re-alert. All
//! cooldown state lives in the ledger; the engine stays side-effect-free.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{info, warn};

use super::domain::VehicleId;
use super::repository::{
    AlertError, GarageRepository, ReminderAlert, ReminderLedger, ReminderSink, RepositoryError,
};
use super::schedule::Urgency;
use super::service::{GarageService, GarageServiceError};

/// Suppression window between two reminders for the same item.
const COOLDOWN_HOURS: i64 = 24;

pub struct ReminderScanner<L, S> {
    ledger: Arc<L>,
    sink: Arc<S>,
}

impl<L, S> ReminderScanner<L, S>
where
    L: ReminderLedger,
    S: ReminderSink,
{
    pub fn new(ledger: Arc<L>, sink: Arc<S>) -> Self {
        Self { ledger, sink }
    }

    /// Walks every vehicle, recomputes its statuses as of `today`, and
    /// publishes a reminder for each `soon`/`overdue` item not already
    /// notified within the cooldown window ending at `now`. Returns the
    /// alerts that were actually dispatched.
    pub fn scan<R>(
        &self,
        service: &GarageService<R>,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReminderAlert>, ScanError>
    where
        R: GarageRepository + 'static,
    {
        let mut published = Vec::new();
        for vehicle in service.vehicles()? {
            for status in service.statuses(&vehicle.id, today)? {
                if !matches!(status.urgency, Urgency::Soon | Urgency::Overdue) {
                    continue;
                }
                if let Some(last) = self
                    .ledger
                    .last_notified(&vehicle.id, &status.intervention)?
                {
                    if now - last <= Duration::hours(COOLDOWN_HOURS) {
                        continue;
                    }
                }

                let alert = ReminderAlert {
                    vehicle_id: vehicle.id.clone(),
                    intervention: status.intervention.clone(),
                    urgency: status.urgency,
                    title: format!("Rappel d'entretien: {}", vehicle.name),
                    body: format!("{}: {}.", status.intervention, status.details),
                };
                self.sink.publish(alert.clone())?;
                self.ledger
                    .mark_notified(&vehicle.id, &status.intervention, now)?;
                published.push(alert);
            }
        }
        Ok(published)
    }
}

/// Error raised by the reminder scan.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error(transparent)]
    Service(#[from] GarageServiceError),
    #[error(transparent)]
    Ledger(#[from] RepositoryError),
    #[error(transparent)]
    Alert(#[from] AlertError),
}

/// JSON-file cooldown ledger keyed by vehicle and intervention type.
pub struct FileReminderLedger {
    path: PathBuf,
    state: Mutex<BTreeMap<String, DateTime<Utc>>>,
}

impl FileReminderLedger {
    /// Opens the ledger at `path`. A missing or unreadable ledger starts
    /// empty; losing cooldown history only risks one extra reminder.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(%err, "reminder ledger unreadable, starting empty");
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };
        Self {
            path,
            state: Mutex::new(state),
        }
    }

    fn state(
        &self,
    ) -> Result<MutexGuard<'_, BTreeMap<String, DateTime<Utc>>>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("ledger mutex poisoned".to_string()))
    }

    fn persist(&self, state: &BTreeMap<String, DateTime<Utc>>) -> Result<(), RepositoryError> {
        let raw = serde_json::to_string_pretty(state)
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

impl ReminderLedger for FileReminderLedger {
    fn last_notified(
        &self,
        vehicle: &VehicleId,
        intervention: &str,
    ) -> Result<Option<DateTime<Utc>>, RepositoryError> {
        Ok(self.state()?.get(&reminder_key(vehicle, intervention)).copied())
    }

    fn mark_notified(
        &self,
        vehicle: &VehicleId,
        intervention: &str,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        state.insert(reminder_key(vehicle, intervention), at);
        self.persist(&state)
    }
}

fn reminder_key(vehicle: &VehicleId, intervention: &str) -> String {
    let compact: String = intervention
        .chars()
        .map(|ch| if ch.is_whitespace() { '_' } else { ch })
        .collect();
    format!("{}_{compact}", vehicle.0)
}

/// Default sink: surfaces reminders through the log, the graceful fallback
/// when no native notification channel is wired up.
pub struct TracingReminderSink;

impl ReminderSink for TracingReminderSink {
    fn publish(&self, alert: ReminderAlert) -> Result<(), AlertError> {
        info!(
            vehicle = %alert.vehicle_id.0,
            urgency = alert.urgency.label(),
            "{}: {}",
            alert.title,
            alert.body
        );
        Ok(())
    }
}
