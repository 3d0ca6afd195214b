//! Due-status inference: projects a vehicle and its event history onto one
//! urgency record per catalog rule. Pure and deterministic; `today` is always
//! an explicit input and the engine never touches a clock or mutates state.

mod config;
mod policy;

pub use config::SchedulePolicy;
pub use policy::Urgency;

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::catalog::{MaintenanceRule, RuleCatalog};
use super::domain::{MaintenanceEvent, Vehicle};
use super::format::{format_date, format_km};
use policy::{classify, distance_soon, time_soon, DueWindow};

/// Stateless engine pairing the rule catalog with the warning thresholds.
pub struct StatusEngine {
    catalog: RuleCatalog,
    policy: SchedulePolicy,
}

/// Derived urgency record for one catalog rule. Recomputed on demand,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceStatus {
    pub intervention: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub every_months: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub every_km: Option<u32>,
    pub urgency: Urgency,
    pub details: String,
}

impl StatusEngine {
    pub fn new(catalog: RuleCatalog, policy: SchedulePolicy) -> Self {
        Self { catalog, policy }
    }

    /// Stock catalog with the default thresholds.
    pub fn standard() -> Self {
        Self::new(RuleCatalog::standard(), SchedulePolicy::default())
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    /// One status per rule applying to the vehicle's category, sorted by
    /// urgency (overdue < soon < unknown < ok) and, within a band, by
    /// catalog position. `events` is the vehicle's full history; entries of
    /// other intervention types are ignored per rule.
    pub fn statuses(
        &self,
        vehicle: &Vehicle,
        events: &[MaintenanceEvent],
        today: NaiveDate,
    ) -> Vec<MaintenanceStatus> {
        let mut statuses: Vec<MaintenanceStatus> = self
            .catalog
            .rules_for(vehicle.fuel)
            .iter()
            .map(|rule| self.rule_status(rule, vehicle, events, today))
            .collect();
        statuses.sort_by_key(|status| status.urgency.rank());
        statuses
    }

    fn rule_status(
        &self,
        rule: &MaintenanceRule,
        vehicle: &Vehicle,
        events: &[MaintenanceEvent],
        today: NaiveDate,
    ) -> MaintenanceStatus {
        let last = latest_event(events, &rule.intervention);

        // A vehicle that never passed an inspection is still on the clock:
        // the first one is mandated a fixed delay after registration.
        if last.is_none() && rule.intervention == self.policy.inspection_type {
            return self.first_inspection(rule, vehicle, today);
        }

        let Some(last) = last else {
            return status(rule, Urgency::Unknown, "Aucun historique".to_string());
        };

        let due_date = rule.every_months.map(|months| add_months(last.date, months));
        let due_km = rule.every_km.map(|interval| last.km.saturating_add(interval));
        let window = DueWindow {
            due_date,
            due_km,
            days_remaining: due_date.map(|due| (due - today).num_days()),
            km_remaining: due_km.map(|due| i64::from(due) - i64::from(vehicle.km)),
        };
        let warning_days = self.policy.warning_days_for(&rule.intervention);

        match classify(&window, today, vehicle.km, warning_days, self.policy.warning_km) {
            Urgency::Overdue => {
                status(rule, Urgency::Overdue, "À faire immédiatement".to_string())
            }
            Urgency::Soon => {
                let mut parts = Vec::new();
                if time_soon(&window, warning_days) {
                    let days = window.days_remaining.unwrap_or_default();
                    parts.push(format!("dans {days} jours"));
                }
                if distance_soon(&window, self.policy.warning_km) {
                    let km = window.km_remaining.unwrap_or_default();
                    parts.push(format!("dans {} km", format_km(km)));
                }
                status(
                    rule,
                    Urgency::Soon,
                    format!("À prévoir {}", parts.join(" ou ")),
                )
            }
            _ => {
                let mut parts = Vec::new();
                if let Some(due) = due_date {
                    parts.push(format!("Prochain: {}", format_date(due)));
                }
                if let Some(due) = due_km {
                    parts.push(format!("à {} km", format_km(i64::from(due))));
                }
                status(rule, Urgency::Ok, parts.join(" / "))
            }
        }
    }

    fn first_inspection(
        &self,
        rule: &MaintenanceRule,
        vehicle: &Vehicle,
        today: NaiveDate,
    ) -> MaintenanceStatus {
        let Some(first_registration) = vehicle.first_registration else {
            return status(
                rule,
                Urgency::Unknown,
                "Date de 1ère immat. manquante".to_string(),
            );
        };

        let due = add_months(first_registration, self.policy.first_inspection_months);
        let days_remaining = (due - today).num_days();

        if today > due {
            status(
                rule,
                Urgency::Overdue,
                format!("À faire depuis le {}", format_date(due)),
            )
        } else if days_remaining <= self.policy.inspection_warning_days {
            status(
                rule,
                Urgency::Soon,
                format!(
                    "À prévoir avant le {} ({days_remaining} jours restants)",
                    format_date(due)
                ),
            )
        } else {
            status(rule, Urgency::Ok, format!("Prochain: {}", format_date(due)))
        }
    }
}

fn status(rule: &MaintenanceRule, urgency: Urgency, details: String) -> MaintenanceStatus {
    MaintenanceStatus {
        intervention: rule.intervention.clone(),
        every_months: rule.every_months,
        every_km: rule.every_km,
        urgency,
        details,
    }
}

/// Most recent event of the given type. Ties on the date resolve to the
/// highest odometer reading, then to the latest inserted record.
fn latest_event<'a>(
    events: &'a [MaintenanceEvent],
    intervention: &str,
) -> Option<&'a MaintenanceEvent> {
    events
        .iter()
        .enumerate()
        .filter(|(_, event)| event.intervention == intervention)
        .max_by_key(|(position, event)| (event.date, event.km, *position))
        .map(|(_, event)| event)
}

// Dates past chrono's range saturate: an interval that far out is never due.
fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}
