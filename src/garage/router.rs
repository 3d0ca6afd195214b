use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;

use super::domain::{EventId, VehicleId};
use super::repository::{GarageRepository, RepositoryError};
use super::service::{EventDraft, GarageService, GarageServiceError, VehicleDraft};

/// Router builder exposing the garage HTTP endpoints.
pub fn garage_router<R>(service: Arc<GarageService<R>>) -> Router
where
    R: GarageRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/vehicles",
            get(list_vehicles_handler::<R>).post(register_vehicle_handler::<R>),
        )
        .route(
            "/api/v1/vehicles/:vehicle_id",
            get(vehicle_handler::<R>)
                .put(update_vehicle_handler::<R>)
                .delete(delete_vehicle_handler::<R>),
        )
        .route(
            "/api/v1/vehicles/:vehicle_id/events",
            get(history_handler::<R>).post(log_event_handler::<R>),
        )
        .route("/api/v1/events/:event_id", delete(delete_event_handler::<R>))
        .route(
            "/api/v1/vehicles/:vehicle_id/statuses",
            get(statuses_handler::<R>),
        )
        .route(
            "/api/v1/vehicles/:vehicle_id/record",
            get(record_handler::<R>),
        )
        .route("/api/v1/interventions", get(interventions_handler::<R>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusQuery {
    #[serde(default)]
    today: Option<NaiveDate>,
}

pub(crate) async fn list_vehicles_handler<R>(
    State(service): State<Arc<GarageService<R>>>,
) -> Response
where
    R: GarageRepository + 'static,
{
    match service.vehicles() {
        Ok(vehicles) => (StatusCode::OK, Json(vehicles)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn register_vehicle_handler<R>(
    State(service): State<Arc<GarageService<R>>>,
    Json(draft): Json<VehicleDraft>,
) -> Response
where
    R: GarageRepository + 'static,
{
    match service.register_vehicle(draft) {
        Ok(vehicle) => (StatusCode::CREATED, Json(vehicle)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn vehicle_handler<R>(
    State(service): State<Arc<GarageService<R>>>,
    Path(vehicle_id): Path<String>,
) -> Response
where
    R: GarageRepository + 'static,
{
    match service.vehicle(&VehicleId(vehicle_id)) {
        Ok(vehicle) => (StatusCode::OK, Json(vehicle)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_vehicle_handler<R>(
    State(service): State<Arc<GarageService<R>>>,
    Path(vehicle_id): Path<String>,
    Json(draft): Json<VehicleDraft>,
) -> Response
where
    R: GarageRepository + 'static,
{
    match service.update_vehicle(&VehicleId(vehicle_id), draft) {
        Ok(vehicle) => (StatusCode::OK, Json(vehicle)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_vehicle_handler<R>(
    State(service): State<Arc<GarageService<R>>>,
    Path(vehicle_id): Path<String>,
) -> Response
where
    R: GarageRepository + 'static,
{
    match service.delete_vehicle(&VehicleId(vehicle_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn history_handler<R>(
    State(service): State<Arc<GarageService<R>>>,
    Path(vehicle_id): Path<String>,
) -> Response
where
    R: GarageRepository + 'static,
{
    match service.history(&VehicleId(vehicle_id)) {
        Ok(events) => (StatusCode::OK, Json(events)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn log_event_handler<R>(
    State(service): State<Arc<GarageService<R>>>,
    Path(vehicle_id): Path<String>,
    Json(draft): Json<EventDraft>,
) -> Response
where
    R: GarageRepository + 'static,
{
    match service.log_event(&VehicleId(vehicle_id), draft) {
        Ok(event) => (StatusCode::CREATED, Json(event)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_event_handler<R>(
    State(service): State<Arc<GarageService<R>>>,
    Path(event_id): Path<String>,
) -> Response
where
    R: GarageRepository + 'static,
{
    match service.delete_event(&EventId(event_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn statuses_handler<R>(
    State(service): State<Arc<GarageService<R>>>,
    Path(vehicle_id): Path<String>,
    Query(query): Query<StatusQuery>,
) -> Response
where
    R: GarageRepository + 'static,
{
    let today = query.today.unwrap_or_else(|| Local::now().date_naive());
    match service.statuses(&VehicleId(vehicle_id), today) {
        Ok(statuses) => (StatusCode::OK, Json(statuses)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn record_handler<R>(
    State(service): State<Arc<GarageService<R>>>,
    Path(vehicle_id): Path<String>,
) -> Response
where
    R: GarageRepository + 'static,
{
    match service.record(&VehicleId(vehicle_id)) {
        Ok(record) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            record.render_text(),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn interventions_handler<R>(
    State(service): State<Arc<GarageService<R>>>,
) -> Response
where
    R: GarageRepository + 'static,
{
    (StatusCode::OK, Json(service.intervention_types())).into_response()
}

fn error_response(error: GarageServiceError) -> Response {
    match error {
        GarageServiceError::Repository(RepositoryError::NotFound) => {
            let payload = json!({ "error": "record not found" });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        GarageServiceError::Repository(RepositoryError::Conflict) => {
            let payload = json!({ "error": "record already exists" });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
        GarageServiceError::EmptyName | GarageServiceError::EmptyIntervention => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        other => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
