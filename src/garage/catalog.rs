use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::FuelType;

/// Intervention name carrying the first-inspection bootstrap logic.
pub const TECHNICAL_INSPECTION: &str = "Contrôle Technique";

/// How often an intervention recurs, by elapsed time and/or distance.
/// At least one interval is set for every catalog rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceRule {
    pub intervention: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub every_months: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub every_km: Option<u32>,
}

fn rule(intervention: &str, every_months: Option<u32>, every_km: Option<u32>) -> MaintenanceRule {
    MaintenanceRule {
        intervention: intervention.to_string(),
        every_months,
        every_km,
    }
}

/// Immutable mapping from drivetrain category to its maintenance schedule.
/// Built once at startup and injected wherever rules are needed; a category
/// missing from the map simply has no applicable rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCatalog {
    rules: BTreeMap<FuelType, Vec<MaintenanceRule>>,
}

impl RuleCatalog {
    pub fn new(rules: BTreeMap<FuelType, Vec<MaintenanceRule>>) -> Self {
        Self { rules }
    }

    /// The stock schedule shipped with the application.
    pub fn standard() -> Self {
        let mut rules = BTreeMap::new();
        rules.insert(
            FuelType::Essence,
            vec![
                rule("Vidange & Filtre à huile", Some(12), Some(15_000)),
                rule("Filtre à air", None, Some(30_000)),
                rule("Filtre habitacle", Some(12), Some(15_000)),
                rule("Bougies d'allumage", None, Some(60_000)),
                rule("Liquide de frein", Some(24), None),
                rule(TECHNICAL_INSPECTION, Some(24), None),
                rule("Pneus été/hiver", Some(6), None),
            ],
        );
        rules.insert(
            FuelType::Diesel,
            vec![
                rule("Vidange & Filtre à huile", Some(12), Some(20_000)),
                rule("Filtre à carburant", None, Some(40_000)),
                rule("Filtre à air", None, Some(40_000)),
                rule("Filtre habitacle", Some(12), Some(20_000)),
                rule("Liquide de frein", Some(24), None),
                rule(TECHNICAL_INSPECTION, Some(24), None),
                rule("Pneus été/hiver", Some(6), None),
            ],
        );
        rules.insert(
            FuelType::Hybride,
            vec![
                rule("Vidange & Filtre à huile", Some(12), Some(15_000)),
                rule("Filtre à air", None, Some(40_000)),
                rule("Filtre habitacle", Some(12), Some(15_000)),
                rule("Liquide de frein", Some(24), None),
                rule(TECHNICAL_INSPECTION, Some(24), None),
                rule("Pneus été/hiver", Some(6), None),
            ],
        );
        rules.insert(
            FuelType::Electrique,
            vec![
                rule("Filtre habitacle", Some(12), Some(25_000)),
                rule("Liquide de frein", Some(24), None),
                rule(TECHNICAL_INSPECTION, Some(24), None),
                rule("Pneus été/hiver", Some(6), None),
            ],
        );
        Self { rules }
    }

    /// Rules applying to a category, in schedule order. Empty when the
    /// category has no catalog entry.
    pub fn rules_for(&self, fuel: FuelType) -> &[MaintenanceRule] {
        self.rules.get(&fuel).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Deduplicated union of intervention names across every category, in
    /// first-seen order. This is the vocabulary offered when logging an
    /// event by hand.
    pub fn intervention_types(&self) -> Vec<String> {
        let mut types: Vec<String> = Vec::new();
        for rules in self.rules.values() {
            for rule in rules {
                if !types.contains(&rule.intervention) {
                    types.push(rule.intervention.clone());
                }
            }
        }
        types
    }
}
