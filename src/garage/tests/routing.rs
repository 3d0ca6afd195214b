use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::garage::domain::FuelType;
use crate::garage::repository::GarageRepository;

fn post_json(uri: &str, payload: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request builds")
}

fn vehicle_payload(name: &str) -> Value {
    json!({
        "name": name,
        "fuel": "Essence",
        "first_registration": "2020-06-15",
        "km": 42_000,
    })
}

#[tokio::test]
async fn registering_a_vehicle_returns_created_with_its_identifier() {
    let (service, _) = build_service();
    let router = garage_router_with_service(service);

    let response = router
        .oneshot(post_json("/api/v1/vehicles", vehicle_payload("Peugeot 208")))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("id"), Some(&json!("veh-000001")));
    assert_eq!(payload.get("fuel"), Some(&json!("Essence")));
}

#[tokio::test]
async fn blank_names_are_unprocessable() {
    let (service, _) = build_service();
    let router = garage_router_with_service(service);

    let response = router
        .oneshot(post_json("/api/v1/vehicles", vehicle_payload("   ")))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_vehicles_are_not_found() {
    let (service, _) = build_service();
    let router = garage_router_with_service(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/vehicles/veh-999999")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn statuses_endpoint_ranks_the_inspection_first_for_an_old_vehicle() {
    let (service, _) = build_service();
    service
        .register_vehicle(vehicle_draft("Peugeot 208", FuelType::Essence, 42_000))
        .expect("vehicle registers");
    let router = garage_router_with_service(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/vehicles/veh-000001/statuses?today=2025-06-15")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let statuses = payload.as_array().expect("status array");
    assert_eq!(statuses.len(), 7);
    assert_eq!(
        statuses[0].get("intervention"),
        Some(&json!("Contrôle Technique"))
    );
    assert_eq!(statuses[0].get("urgency"), Some(&json!("overdue")));
    assert_eq!(
        statuses[0].get("details"),
        Some(&json!("À faire depuis le 15/06/2024"))
    );
}

#[tokio::test]
async fn logging_and_deleting_events_round_trips() {
    let (service, repository) = build_service();
    service
        .register_vehicle(vehicle_draft("Peugeot 208", FuelType::Essence, 42_000))
        .expect("vehicle registers");
    let router = garage_router_with_service(service);

    let response = router
        .clone()
        .oneshot(post_json(
            "/api/v1/vehicles/veh-000001/events",
            json!({
                "intervention": "Vidange & Filtre à huile",
                "date": "2025-05-01",
                "km": 43_500,
                "cost": 89.9,
            }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("id"), Some(&json!("evt-000001")));

    let bumped = repository
        .vehicle(&crate::garage::domain::VehicleId("veh-000001".to_string()))
        .expect("vehicle loads")
        .expect("vehicle present");
    assert_eq!(bumped.km, 43_500, "odometer catches up with the event");

    let response = router
        .oneshot(
            Request::delete("/api/v1/events/evt-000001")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(repository.events().expect("events load").is_empty());
}

#[tokio::test]
async fn deleting_a_vehicle_cascades_through_the_api() {
    let (service, repository) = build_service();
    let vehicle = service
        .register_vehicle(vehicle_draft("Peugeot 208", FuelType::Essence, 42_000))
        .expect("vehicle registers");
    service
        .log_event(&vehicle.id, event_draft("Liquide de frein", date(2025, 1, 1), 42_100))
        .expect("event logs");
    let router = garage_router_with_service(service);

    let response = router
        .oneshot(
            Request::delete("/api/v1/vehicles/veh-000001")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(repository.vehicles().expect("vehicles load").is_empty());
    assert!(
        repository.events().expect("events load").is_empty(),
        "no orphaned events remain"
    );
}

#[tokio::test]
async fn record_endpoint_serves_the_plain_text_carnet() {
    let (service, _) = build_service();
    service
        .register_vehicle(vehicle_draft("Peugeot 208", FuelType::Essence, 42_000))
        .expect("vehicle registers");
    let router = garage_router_with_service(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/vehicles/veh-000001/record")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("text/plain; charset=utf-8")
    );
    let text = read_text_body(response).await;
    assert!(text.starts_with("Carnet d'Entretien"));
    assert!(text.contains("Aucun évènement enregistré."));
}

#[tokio::test]
async fn interventions_endpoint_lists_the_catalog_vocabulary() {
    let (service, _) = build_service();
    let router = garage_router_with_service(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/interventions")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let types = payload.as_array().expect("vocabulary array");
    assert!(types.contains(&json!("Contrôle Technique")));
    assert!(types.contains(&json!("Bougies d'allumage")));
}
