use serde::{Deserialize, Serialize};

use crate::garage::catalog::TECHNICAL_INSPECTION;

/// Thresholds steering the urgency classification. Injected alongside the
/// rule catalog so synthetic policies can drive the engine in tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulePolicy {
    /// Days before a due date at which an item becomes "soon".
    pub warning_days: i64,
    /// Wider window for the technical inspection, which needs booking ahead.
    pub inspection_warning_days: i64,
    /// Distance before a due odometer reading at which an item becomes "soon".
    pub warning_km: i64,
    /// Months between first registration and the mandated first inspection.
    pub first_inspection_months: u32,
    /// Intervention name the bootstrap and the wider warning window apply to.
    pub inspection_type: String,
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        Self {
            warning_days: 30,
            inspection_warning_days: 90,
            warning_km: 1_000,
            first_inspection_months: 48,
            inspection_type: TECHNICAL_INSPECTION.to_string(),
        }
    }
}

impl SchedulePolicy {
    pub(crate) fn warning_days_for(&self, intervention: &str) -> i64 {
        if intervention == self.inspection_type {
            self.inspection_warning_days
        } else {
            self.warning_days
        }
    }
}
