use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for registered vehicles.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VehicleId(pub String);

/// Identifier wrapper for logged maintenance events.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

/// Drivetrain category. Decides which maintenance schedule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FuelType {
    Essence,
    Diesel,
    Hybride,
    #[serde(rename = "Électrique")]
    Electrique,
}

impl FuelType {
    pub const fn label(self) -> &'static str {
        match self {
            FuelType::Essence => "Essence",
            FuelType::Diesel => "Diesel",
            FuelType::Hybride => "Hybride",
            FuelType::Electrique => "Électrique",
        }
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FuelType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "essence" => Ok(FuelType::Essence),
            "diesel" => Ok(FuelType::Diesel),
            "hybride" => Ok(FuelType::Hybride),
            "électrique" | "electrique" => Ok(FuelType::Electrique),
            other => Err(format!("unknown fuel type '{other}'")),
        }
    }
}

/// A vehicle in the garage. Everything except the identifier can be edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plate: Option<String>,
    pub fuel: FuelType,
    /// First-registration date; absent when the user never provided one or
    /// the stored value could not be read back as a date.
    #[serde(default)]
    pub first_registration: Option<NaiveDate>,
    /// Current odometer reading, in km.
    pub km: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argus_url: Option<String>,
}

/// One performed intervention. Immutable once logged; create and delete only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceEvent {
    pub id: EventId,
    pub vehicle_id: VehicleId,
    /// Intervention type, conventionally one of the catalog's names.
    pub intervention: String,
    pub date: NaiveDate,
    /// Odometer reading at the time of service, in km.
    pub km: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Receipt photo as an opaque data-URL payload, carried verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}
