use std::fs::File;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use carnet::config::AppConfig;
use carnet::error::AppError;
use carnet::garage::{
    garage_router, FileReminderLedger, GarageService, JsonStore, MaintenanceStatus,
    ReminderScanner, StatusEngine, TracingReminderSink, Vehicle, VehicleId,
};
use carnet::telemetry;
use chrono::{Local, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

type Garage = GarageService<JsonStore>;
type Scanner = ReminderScanner<FileReminderLedger, TracingReminderSink>;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
    garage: Arc<Garage>,
    scanner: Arc<Scanner>,
}

#[derive(Parser, Debug)]
#[command(
    name = "carnet",
    about = "Track vehicles, log maintenance, and surface due service items",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print ranked maintenance statuses for stored vehicles
    Status(StatusArgs),
    /// Render the printable maintenance record for a vehicle
    Export(ExportArgs),
    /// Run the reminder scan once and list dispatched alerts
    Scan(ScanArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct StatusArgs {
    /// Vehicle identifier; omit to report every stored vehicle
    #[arg(long)]
    vehicle: Option<String>,
    /// Evaluation date (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    today: Option<NaiveDate>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Vehicle identifier
    #[arg(long)]
    vehicle: String,
    /// Write the history as CSV to this path instead of printing the carnet
    #[arg(long)]
    csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Evaluation date (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct ScanQuery {
    #[serde(default)]
    today: Option<NaiveDate>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Status(args) => run_status(args),
        Command::Export(args) => run_export(args),
        Command::Scan(args) => run_scan(args),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

fn open_garage(config: &AppConfig) -> Result<Arc<Garage>, AppError> {
    let store = JsonStore::open(&config.storage.garage_path)?;
    let service = GarageService::new(Arc::new(store), StatusEngine::standard())?;
    Ok(Arc::new(service))
}

fn open_scanner(config: &AppConfig) -> Arc<Scanner> {
    let ledger = Arc::new(FileReminderLedger::open(&config.storage.ledger_path));
    Arc::new(ReminderScanner::new(ledger, Arc::new(TracingReminderSink)))
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let garage = open_garage(&config)?;
    let scanner = open_scanner(&config);

    // Startup hook: surface anything already due before the first request.
    match scanner.scan(&garage, Local::now().date_naive(), Utc::now()) {
        Ok(alerts) => info!(dispatched = alerts.len(), "startup reminder scan complete"),
        Err(err) => warn!(%err, "startup reminder scan failed"),
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
        garage: garage.clone(),
        scanner,
    };

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/reminders/scan", post(scan_endpoint))
        .with_state(state)
        .merge(garage_router(garage))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "maintenance tracker ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_status(args: StatusArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let garage = open_garage(&config)?;
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());

    let vehicles = match args.vehicle {
        Some(id) => vec![garage.vehicle(&VehicleId(id))?],
        None => garage.vehicles()?,
    };

    if vehicles.is_empty() {
        println!("No vehicles on file.");
        return Ok(());
    }

    for (index, vehicle) in vehicles.iter().enumerate() {
        if index > 0 {
            println!();
        }
        let statuses = garage.statuses(&vehicle.id, today)?;
        render_statuses(vehicle, &statuses, today);
    }

    Ok(())
}

fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let garage = open_garage(&config)?;
    let record = garage.record(&VehicleId(args.vehicle))?;

    match args.csv {
        Some(path) => {
            let file = File::create(&path)?;
            record.write_csv(file)?;
            println!(
                "Wrote {} event(s) to {}",
                record.events().len(),
                path.display()
            );
        }
        None => print!("{}", record.render_text()),
    }

    Ok(())
}

fn run_scan(args: ScanArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let garage = open_garage(&config)?;
    let scanner = open_scanner(&config);
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());

    let alerts = scanner.scan(&garage, today, Utc::now())?;
    if alerts.is_empty() {
        println!("Nothing due, no reminders dispatched.");
    } else {
        println!("Dispatched {} reminder(s):", alerts.len());
        for alert in &alerts {
            println!("- {} | {}", alert.title, alert.body);
        }
    }

    Ok(())
}

fn render_statuses(vehicle: &Vehicle, statuses: &[MaintenanceStatus], today: NaiveDate) {
    println!(
        "{} ({}, {} km), evaluated {}",
        vehicle.name, vehicle.fuel, vehicle.km, today
    );
    for status in statuses {
        println!(
            "- [{}] {}: {}",
            status.urgency.label(),
            status.intervention,
            status.details
        );
    }
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

async fn scan_endpoint(
    State(state): State<AppState>,
    Query(query): Query<ScanQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let today = query.today.unwrap_or_else(|| Local::now().date_naive());
    let alerts = state.scanner.scan(&state.garage, today, Utc::now())?;
    Ok(Json(json!({
        "today": today,
        "dispatched": alerts,
    })))
}
