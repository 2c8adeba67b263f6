use crate::db::models::{
    MaintenanceFilter, MaintenanceOrder, MaintenanceStatus, Vehicle, VehicleFilter,
};
use crate::error::ApiError;
use crate::maintenances::MaintenanceView;
use crate::startup::AppState;
use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub total_vehicles: i64,
    pub total_maintenances: i64,
    pub pending_maintenances: i64,
    pub overdue_maintenances: i64,
    /// Completed during the last 7 days.
    pub recent_maintenances: i64,
    /// Next 5 scheduled within the coming 7 days, soonest first.
    pub upcoming_maintenances: Vec<MaintenanceView>,
    pub recent_vehicles: Vec<Vehicle>,
}

pub async fn dashboard(
    Extension(app_state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let store = app_state.store.as_ref();
    let now = Utc::now();

    let pending = MaintenanceFilter {
        status: Some(MaintenanceStatus::Scheduled),
        ..Default::default()
    };
    let overdue = MaintenanceFilter {
        scheduled_before: Some(now),
        ..pending.clone()
    };
    let recent = MaintenanceFilter {
        completed_since: Some(now - Duration::days(7)),
        ..Default::default()
    };
    let upcoming = MaintenanceFilter {
        scheduled_from: Some(now),
        // The upper bound is inclusive here, hence the extra instant.
        scheduled_before: Some(now + Duration::days(7) + Duration::microseconds(1)),
        order: MaintenanceOrder::SoonestFirst,
        limit: Some(5),
        ..pending.clone()
    };

    let response = DashboardResponse {
        total_vehicles: store.count_vehicles().await?,
        total_maintenances: store.count_maintenances(&MaintenanceFilter::default()).await?,
        pending_maintenances: store.count_maintenances(&pending).await?,
        overdue_maintenances: store.count_maintenances(&overdue).await?,
        recent_maintenances: store.count_maintenances(&recent).await?,
        upcoming_maintenances: store
            .list_maintenances(&upcoming)
            .await?
            .into_iter()
            .map(|m| MaintenanceView::new(m, now))
            .collect(),
        recent_vehicles: store
            .list_vehicles(&VehicleFilter {
                search: None,
                limit: Some(5),
            })
            .await?,
    };

    Ok((StatusCode::OK, Json(response)))
}
