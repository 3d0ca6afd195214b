use super::common::*;
use crate::garage::domain::FuelType;
use crate::garage::record::MaintenanceRecord;

#[test]
fn carnet_lists_history_newest_first_with_the_vehicle_header() {
    let mut vehicle = vehicle_with(FuelType::Essence, 42_000, Some(date(2020, 6, 15)));
    vehicle.argus_url = Some("https://www.largus.fr/cote/208".to_string());
    let mut oil = event(
        &vehicle,
        "000001",
        "Vidange & Filtre à huile",
        date(2024, 3, 15),
        38_000,
    );
    oil.cost = Some(89.9);
    oil.notes = Some("Huile 5W30".to_string());
    let brake = event(&vehicle, "000002", "Liquide de frein", date(2025, 1, 10), 41_000);

    // Inserted oldest first; the record must flip the order.
    let record = MaintenanceRecord::new(vehicle, vec![oil, brake]);
    let text = record.render_text();

    assert!(text.starts_with("Carnet d'Entretien\nPeugeot 208\n"));
    assert!(text.contains("MEC: 15/06/2020 - Essence - 42 000 km"));
    assert!(text.contains("Immatriculation: AB-123-CD"));
    assert!(text.contains("Cote Argus: https://www.largus.fr/cote/208"));
    assert!(text.contains("Historique des interventions"));

    let brake_at = text.find("Liquide de frein").expect("brake entry present");
    let oil_at = text
        .find("Vidange & Filtre à huile")
        .expect("oil entry present");
    assert!(brake_at < oil_at, "newest intervention comes first");

    assert!(text.contains("15/03/2024 à 38 000 km - Coût: 89,90 €"));
    assert!(text.contains("Notes: Huile 5W30"));
}

#[test]
fn carnet_without_history_says_so() {
    let vehicle = vehicle_with(FuelType::Electrique, 500, None);

    let record = MaintenanceRecord::new(vehicle, Vec::new());
    let text = record.render_text();

    assert!(text.contains("MEC: inconnue - Électrique - 500 km"));
    assert!(text.contains("Aucun évènement enregistré."));
}

#[test]
fn record_ignores_events_of_other_vehicles() {
    let vehicle = vehicle_with(FuelType::Essence, 42_000, Some(date(2020, 6, 15)));
    let mut stray = event(&vehicle, "000009", "Filtre à air", date(2024, 5, 1), 9_000);
    stray.vehicle_id = crate::garage::domain::VehicleId("veh-000099".to_string());

    let record = MaintenanceRecord::new(vehicle, vec![stray]);

    assert!(record.events().is_empty());
}

#[test]
fn csv_export_is_one_row_per_event() {
    let vehicle = vehicle_with(FuelType::Essence, 42_000, Some(date(2020, 6, 15)));
    let mut oil = event(
        &vehicle,
        "000001",
        "Vidange & Filtre à huile",
        date(2024, 3, 15),
        38_000,
    );
    oil.cost = Some(89.9);
    let brake = event(&vehicle, "000002", "Liquide de frein", date(2025, 1, 10), 41_000);

    let record = MaintenanceRecord::new(vehicle, vec![oil, brake]);
    let mut buffer = Vec::new();
    record.write_csv(&mut buffer).expect("csv writes");
    let csv = String::from_utf8(buffer).expect("utf-8 csv");

    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("date,intervention,km,cost,notes"));
    assert_eq!(lines.next(), Some("2025-01-10,Liquide de frein,41000,,"));
    assert_eq!(
        lines.next(),
        Some("2024-03-15,Vidange & Filtre à huile,38000,89.9,")
    );
    assert_eq!(lines.next(), None);
}
