use crate::db::models::{
    Maintenance, MaintenanceFilter, MaintenanceOrder, MaintenanceStatus, Vehicle, VehicleFilter,
};
use crate::error::{ApiError, StoreError};
use crate::maintenances::MaintenanceView;
use crate::startup::AppState;
use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct VehicleListQuery {
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VehicleResponse {
    #[serde(flatten)]
    pub vehicle: Vehicle,
    pub full_name: String,
    pub vehicle_type_label: &'static str,
    pub fuel_type_label: &'static str,
}

impl From<Vehicle> for VehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        Self {
            full_name: vehicle.full_name(),
            vehicle_type_label: vehicle.vehicle_type.label(),
            fuel_type_label: vehicle.fuel_type.label(),
            vehicle,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VehicleDetailResponse {
    #[serde(flatten)]
    pub vehicle: VehicleResponse,
    pub maintenances: Vec<MaintenanceView>,
    /// Next 3 scheduled maintenances from now on.
    pub upcoming_maintenances: Vec<MaintenanceView>,
}

pub async fn list_vehicles(
    Extension(app_state): Extension<AppState>,
    Query(query): Query<VehicleListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let vehicles: Vec<VehicleResponse> = app_state
        .store
        .list_vehicles(&VehicleFilter {
            search: query.search,
            limit: None,
        })
        .await?
        .into_iter()
        .map(VehicleResponse::from)
        .collect();

    Ok((StatusCode::OK, Json(vehicles)))
}

pub async fn vehicle_detail(
    Extension(app_state): Extension<AppState>,
    Path(vehicle_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let store = app_state.store.as_ref();
    let now = Utc::now();

    let vehicle = store
        .get_vehicle(vehicle_id)
        .await?
        .ok_or_else(|| StoreError::not_found("vehicle", vehicle_id))?;

    let maintenances = store
        .list_maintenances(&MaintenanceFilter {
            vehicle_id: Some(vehicle_id),
            ..Default::default()
        })
        .await?;

    let upcoming_maintenances = store
        .list_maintenances(&MaintenanceFilter {
            vehicle_id: Some(vehicle_id),
            status: Some(MaintenanceStatus::Scheduled),
            scheduled_from: Some(now),
            order: MaintenanceOrder::SoonestFirst,
            limit: Some(3),
            ..Default::default()
        })
        .await?;

    let view = |list: Vec<Maintenance>| -> Vec<MaintenanceView> {
        list.into_iter()
            .map(|m| MaintenanceView::new(m, now))
            .collect()
    };

    let response = VehicleDetailResponse {
        vehicle: VehicleResponse::from(vehicle),
        maintenances: view(maintenances),
        upcoming_maintenances: view(upcoming_maintenances),
    };

    Ok((StatusCode::OK, Json(response)))
}
