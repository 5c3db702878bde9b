use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use fleet_mock::{
    assistant_summary, energy_output, fleet_kpis, generate_turbines, turbine_clusters,
    AssistantSummary, ClusterPoint, EnergyOutput, FleetKpis, MaintenanceAck, Turbine,
    TurbineStatus,
};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/kpis", get(get_fleet_kpis))
        .route("/turbines", get(list_turbines))
        .route("/turbines/{id}", get(get_turbine))
        .route("/turbines/{id}/maintenance", post(schedule_maintenance))
        .route("/turbines/map/clusters", get(get_turbine_clusters))
        .route("/energy-output", get(get_energy_output))
        .route("/assistant-summary", get(get_assistant_summary))
}

#[derive(Debug, Deserialize)]
pub struct TurbineFilter {
    pub status: Option<TurbineStatus>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

#[derive(Debug, Deserialize)]
pub struct EnergyWindow {
    #[serde(default = "default_hours")]
    pub hours: u32,
}

#[derive(Debug, Deserialize)]
pub struct MaintenanceRequest {
    pub maintenance_date: DateTime<Utc>,
}

fn default_limit() -> usize {
    100
}

fn default_hours() -> u32 {
    24
}

fn fleet(state: &AppState) -> Vec<Turbine> {
    generate_turbines(&mut state.fleet_rng(), state.config.fleet.size, Utc::now())
}

pub async fn get_fleet_kpis(State(state): State<AppState>) -> Json<FleetKpis> {
    Json(fleet_kpis(&fleet(&state)))
}

pub async fn list_turbines(
    State(state): State<AppState>,
    Query(filter): Query<TurbineFilter>,
) -> Json<Vec<Turbine>> {
    let turbines = fleet(&state)
        .into_iter()
        .filter(|turbine| filter.status.map_or(true, |status| turbine.status == status))
        .skip(filter.offset)
        .take(filter.limit)
        .collect();

    Json(turbines)
}

pub async fn get_turbine(
    State(state): State<AppState>,
    Path(turbine_id): Path<u32>,
) -> Result<Json<Turbine>, ApiError> {
    fleet(&state)
        .into_iter()
        .find(|turbine| turbine.id == turbine_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Turbine {} not found", turbine_id)))
}

pub async fn get_energy_output(
    State(state): State<AppState>,
    Query(window): Query<EnergyWindow>,
) -> Json<Vec<EnergyOutput>> {
    Json(energy_output(&mut state.fleet_rng(), window.hours, Utc::now()))
}

pub async fn get_assistant_summary() -> Json<AssistantSummary> {
    Json(assistant_summary())
}

pub async fn schedule_maintenance(
    Path(turbine_id): Path<u32>,
    Query(request): Query<MaintenanceRequest>,
) -> Json<MaintenanceAck> {
    tracing::info!(turbine_id, "maintenance scheduled for {}", request.maintenance_date);
    Json(MaintenanceAck::scheduled(turbine_id, request.maintenance_date))
}

pub async fn get_turbine_clusters(State(state): State<AppState>) -> Json<Vec<ClusterPoint>> {
    Json(turbine_clusters(&mut state.fleet_rng()))
}
