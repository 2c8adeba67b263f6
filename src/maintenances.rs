use crate::db::models::{
    LabeledVariant, Maintenance, MaintenanceFilter, MaintenanceStatus, MaintenanceType,
    ServiceEvaluation, Vehicle,
};
use crate::error::{ApiError, StoreError};
use crate::startup::AppState;
use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A maintenance record together with its derived facts at render time.
#[derive(Debug, Serialize)]
pub struct MaintenanceView {
    #[serde(flatten)]
    pub maintenance: Maintenance,
    pub status_label: &'static str,
    pub is_overdue: bool,
    pub duration_secs: Option<i64>,
}

impl MaintenanceView {
    pub fn new(maintenance: Maintenance, now: DateTime<Utc>) -> Self {
        Self {
            status_label: maintenance.status.label(),
            is_overdue: maintenance.is_overdue(now),
            duration_secs: maintenance.duration().map(|d| d.num_seconds()),
            maintenance,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MaintenanceListQuery {
    pub status: Option<MaintenanceStatus>,
    pub vehicle: Option<Uuid>,
    /// Inclusive lower bound on the scheduled date.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on the scheduled date.
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct MaintenanceListResponse {
    pub maintenances: Vec<MaintenanceView>,
    pub status_choices: Vec<LabeledVariant<MaintenanceStatus>>,
    pub overdue_count: i64,
}

#[derive(Debug, Serialize)]
pub struct MaintenanceDetailResponse {
    #[serde(flatten)]
    pub maintenance: MaintenanceView,
    pub vehicle: Option<Vehicle>,
    pub maintenance_type: Option<MaintenanceType>,
    pub evaluation: Option<ServiceEvaluation>,
}

pub async fn list_maintenances(
    Extension(app_state): Extension<AppState>,
    Query(query): Query<MaintenanceListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let now = Utc::now();
    let filter = MaintenanceFilter {
        vehicle_id: query.vehicle,
        status: query.status,
        scheduled_from: query.from,
        scheduled_before: query.to,
        ..Default::default()
    };

    let maintenances = app_state
        .store
        .list_maintenances(&filter)
        .await?
        .into_iter()
        .map(|m| MaintenanceView::new(m, now))
        .collect();

    let overdue_count = app_state
        .store
        .count_maintenances(&MaintenanceFilter {
            status: Some(MaintenanceStatus::Scheduled),
            scheduled_before: Some(now),
            ..Default::default()
        })
        .await?;

    let status_choices = MaintenanceStatus::choices();

    Ok((
        StatusCode::OK,
        Json(MaintenanceListResponse {
            maintenances,
            status_choices,
            overdue_count,
        }),
    ))
}

pub async fn maintenance_detail(
    Extension(app_state): Extension<AppState>,
    Path(maintenance_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let store = app_state.store.as_ref();
    let maintenance = store
        .get_maintenance(maintenance_id)
        .await?
        .ok_or_else(|| StoreError::not_found("maintenance", maintenance_id))?;

    let vehicle = store.get_vehicle(maintenance.vehicle_id).await?;
    let maintenance_type = store
        .get_maintenance_type(maintenance.maintenance_type_id)
        .await?;
    let evaluation = store.get_evaluation_for_maintenance(maintenance_id).await?;

    let response = MaintenanceDetailResponse {
        maintenance: MaintenanceView::new(maintenance, Utc::now()),
        vehicle,
        maintenance_type,
        evaluation,
    };

    Ok((StatusCode::OK, Json(response)))
}
