use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Urgency band for a maintenance item, most pressing first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Overdue,
    Soon,
    Unknown,
    Ok,
}

impl Urgency {
    pub const fn label(self) -> &'static str {
        match self {
            Urgency::Overdue => "overdue",
            Urgency::Soon => "soon",
            Urgency::Unknown => "unknown",
            Urgency::Ok => "ok",
        }
    }

    /// Sort rank: overdue < soon < unknown < ok.
    pub(crate) const fn rank(self) -> u8 {
        match self {
            Urgency::Overdue => 0,
            Urgency::Soon => 1,
            Urgency::Unknown => 2,
            Urgency::Ok => 3,
        }
    }
}

/// Due thresholds for one rule, on whichever dimensions the rule defines.
pub(crate) struct DueWindow {
    pub due_date: Option<NaiveDate>,
    pub due_km: Option<u32>,
    pub days_remaining: Option<i64>,
    pub km_remaining: Option<i64>,
}

/// Time and distance are independent OR-conditions: crossing either due
/// threshold is overdue, entering either warning window is soon.
pub(crate) fn classify(
    window: &DueWindow,
    today: NaiveDate,
    odometer: u32,
    warning_days: i64,
    warning_km: i64,
) -> Urgency {
    let time_overdue = window.due_date.map(|due| today > due).unwrap_or(false);
    let distance_overdue = window.due_km.map(|due| odometer > due).unwrap_or(false);
    if time_overdue || distance_overdue {
        return Urgency::Overdue;
    }

    if time_soon(window, warning_days) || distance_soon(window, warning_km) {
        return Urgency::Soon;
    }

    Urgency::Ok
}

pub(crate) fn time_soon(window: &DueWindow, warning_days: i64) -> bool {
    window.due_date.is_some()
        && window
            .days_remaining
            .map(|days| days <= warning_days)
            .unwrap_or(false)
}

pub(crate) fn distance_soon(window: &DueWindow, warning_km: i64) -> bool {
    window.due_km.is_some()
        && window
            .km_remaining
            .map(|km| km <= warning_km)
            .unwrap_or(false)
}
