//! Printable service record: the vehicle header plus its raw history, newest
//! first. A dump of what happened, not a due-date report; it never consults
//! the status engine.

use serde::Serialize;

use super::domain::{MaintenanceEvent, Vehicle};
use super::format::{format_cost, format_date, format_km};

pub struct MaintenanceRecord {
    vehicle: Vehicle,
    events: Vec<MaintenanceEvent>,
}

impl MaintenanceRecord {
    /// Builds the record, keeping only the vehicle's own events and sorting
    /// them descending by date.
    pub fn new(vehicle: Vehicle, mut events: Vec<MaintenanceEvent>) -> Self {
        events.retain(|event| event.vehicle_id == vehicle.id);
        events.sort_by(|a, b| b.date.cmp(&a.date));
        Self { vehicle, events }
    }

    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    pub fn events(&self) -> &[MaintenanceEvent] {
        &self.events
    }

    /// The carnet as plain text, one block per intervention.
    pub fn render_text(&self) -> String {
        let mut lines = Vec::new();
        lines.push("Carnet d'Entretien".to_string());
        lines.push(self.vehicle.name.clone());

        let registration = self
            .vehicle
            .first_registration
            .map(format_date)
            .unwrap_or_else(|| "inconnue".to_string());
        lines.push(format!(
            "MEC: {registration} - {} - {} km",
            self.vehicle.fuel.label(),
            format_km(i64::from(self.vehicle.km))
        ));
        if let Some(plate) = &self.vehicle.plate {
            lines.push(format!("Immatriculation: {plate}"));
        }
        if let Some(url) = &self.vehicle.argus_url {
            lines.push(format!("Cote Argus: {url}"));
        }

        lines.push(String::new());
        lines.push("Historique des interventions".to_string());

        if self.events.is_empty() {
            lines.push("Aucun évènement enregistré.".to_string());
        }
        for event in &self.events {
            lines.push(String::new());
            lines.push(event.intervention.clone());
            let mut detail = format!(
                "{} à {} km",
                format_date(event.date),
                format_km(i64::from(event.km))
            );
            if let Some(cost) = event.cost {
                detail.push_str(&format!(" - Coût: {}", format_cost(cost)));
            }
            lines.push(detail);
            if let Some(notes) = &event.notes {
                lines.push(format!("Notes: {notes}"));
            }
        }

        lines.join("\n") + "\n"
    }

    /// Tabular export of the same history, newest first.
    pub fn write_csv<W: std::io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_writer(writer);
        for event in &self.events {
            writer.serialize(CsvRow {
                date: event.date.format("%Y-%m-%d").to_string(),
                intervention: &event.intervention,
                km: event.km,
                cost: event.cost,
                notes: event.notes.as_deref().unwrap_or(""),
            })?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    date: String,
    intervention: &'a str,
    km: u32,
    cost: Option<f64>,
    notes: &'a str,
}
