//! Administrative record management. Authentication is left to whatever sits
//! in front of the service.

use crate::config::SiteConfig;
use crate::db::models::{
    ChoiceInput, EvaluationFilter, EvaluationInput, FuelType, LabeledVariant, MaintenanceFilter,
    MaintenanceInput, MaintenanceStatus, MaintenanceTypeInput, ServiceEvaluation, VehicleInput,
    VehicleType,
};
use crate::domain::{ChoiceTally, choice_percentage, percentage, total_votes};
use crate::error::{ApiError, StoreError};
use crate::startup::AppState;
use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct AdminIndexResponse {
    #[serde(flatten)]
    pub site: SiteConfig,
    pub vehicles: i64,
    pub maintenance_types: i64,
    pub maintenances: i64,
    pub evaluations: i64,
    pub vehicle_types: Vec<LabeledVariant<VehicleType>>,
    pub fuel_types: Vec<LabeledVariant<FuelType>>,
    pub maintenance_statuses: Vec<LabeledVariant<MaintenanceStatus>>,
}

#[derive(Debug, Deserialize)]
pub struct MaintenanceTypeQuery {
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct AdminEvaluationRow {
    #[serde(flatten)]
    pub evaluation: ServiceEvaluation,
    pub was_published_recently: bool,
    pub total_votes: i64,
    pub choices_count: usize,
}

fn require_text(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidRequest(format!("{field} must not be blank")));
    }
    Ok(())
}

pub async fn index(Extension(app_state): Extension<AppState>) -> Result<impl IntoResponse, ApiError> {
    let store = app_state.store.as_ref();
    let response = AdminIndexResponse {
        site: app_state.site.as_ref().clone(),
        vehicles: store.count_vehicles().await?,
        maintenance_types: store.count_maintenance_types().await?,
        maintenances: store.count_maintenances(&MaintenanceFilter::default()).await?,
        evaluations: store.count_evaluations().await?,
        vehicle_types: VehicleType::choices(),
        fuel_types: FuelType::choices(),
        maintenance_statuses: MaintenanceStatus::choices(),
    };

    Ok((StatusCode::OK, Json(response)))
}

pub async fn create_vehicle(
    Extension(app_state): Extension<AppState>,
    Json(payload): Json<VehicleInput>,
) -> Result<impl IntoResponse, ApiError> {
    require_text("license_plate", &payload.license_plate)?;
    let vehicle = app_state.store.create_vehicle(payload).await?;
    info!("vehicle {} registered as {}", vehicle.license_plate, vehicle.id);
    Ok((StatusCode::CREATED, Json(vehicle)))
}

pub async fn update_vehicle(
    Extension(app_state): Extension<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<VehicleInput>,
) -> Result<impl IntoResponse, ApiError> {
    require_text("license_plate", &payload.license_plate)?;
    let vehicle = app_state.store.update_vehicle(id, payload).await?;
    Ok((StatusCode::OK, Json(vehicle)))
}

pub async fn delete_vehicle(
    Extension(app_state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state.store.delete_vehicle(id).await?;
    info!("vehicle {} deleted with its maintenance history", id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_maintenance_types(
    Extension(app_state): Extension<AppState>,
    Query(query): Query<MaintenanceTypeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let types = app_state.store.list_maintenance_types(query.active).await?;
    Ok((StatusCode::OK, Json(types)))
}

pub async fn create_maintenance_type(
    Extension(app_state): Extension<AppState>,
    Json(payload): Json<MaintenanceTypeInput>,
) -> Result<impl IntoResponse, ApiError> {
    let maintenance_type = app_state.store.create_maintenance_type(payload).await?;
    Ok((StatusCode::CREATED, Json(maintenance_type)))
}

pub async fn update_maintenance_type(
    Extension(app_state): Extension<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MaintenanceTypeInput>,
) -> Result<impl IntoResponse, ApiError> {
    let maintenance_type = app_state.store.update_maintenance_type(id, payload).await?;
    Ok((StatusCode::OK, Json(maintenance_type)))
}

pub async fn delete_maintenance_type(
    Extension(app_state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state.store.delete_maintenance_type(id).await?;
    info!("maintenance type {} deleted", id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_maintenance(
    Extension(app_state): Extension<AppState>,
    Json(payload): Json<MaintenanceInput>,
) -> Result<impl IntoResponse, ApiError> {
    let maintenance = app_state.store.create_maintenance(payload).await?;
    Ok((StatusCode::CREATED, Json(maintenance)))
}

pub async fn update_maintenance(
    Extension(app_state): Extension<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MaintenanceInput>,
) -> Result<impl IntoResponse, ApiError> {
    let maintenance = app_state.store.update_maintenance(id, payload).await?;
    Ok((StatusCode::OK, Json(maintenance)))
}

pub async fn delete_maintenance(
    Extension(app_state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state.store.delete_maintenance(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_evaluations(
    Extension(app_state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let store = app_state.store.as_ref();
    let now = Utc::now();

    let mut rows = Vec::new();
    for evaluation in store.list_evaluations(&EvaluationFilter::default()).await? {
        let choices = store.list_choices(evaluation.id).await?;
        rows.push(AdminEvaluationRow {
            was_published_recently: evaluation.was_published_recently(now),
            total_votes: total_votes(&choices),
            choices_count: choices.len(),
            evaluation,
        });
    }

    Ok((StatusCode::OK, Json(rows)))
}

pub async fn create_evaluation(
    Extension(app_state): Extension<AppState>,
    Json(payload): Json<EvaluationInput>,
) -> Result<impl IntoResponse, ApiError> {
    require_text("question_text", &payload.question_text)?;
    let evaluation = app_state.store.create_evaluation(payload).await?;
    Ok((StatusCode::CREATED, Json(evaluation)))
}

pub async fn update_evaluation(
    Extension(app_state): Extension<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EvaluationInput>,
) -> Result<impl IntoResponse, ApiError> {
    require_text("question_text", &payload.question_text)?;
    let evaluation = app_state.store.update_evaluation(id, payload).await?;
    Ok((StatusCode::OK, Json(evaluation)))
}

pub async fn delete_evaluation(
    Extension(app_state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state.store.delete_evaluation(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Choices of one evaluation with their share of the votes
pub async fn list_choices(
    Extension(app_state): Extension<AppState>,
    Path(evaluation_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let store = app_state.store.as_ref();
    if store.get_evaluation(evaluation_id).await?.is_none() {
        return Err(StoreError::not_found("evaluation", evaluation_id).into());
    }

    let choices = store.list_choices(evaluation_id).await?;
    let total = total_votes(&choices);
    let rows: Vec<ChoiceTally> = choices
        .into_iter()
        .map(|choice| ChoiceTally {
            percentage: percentage(choice.votes, total),
            choice,
        })
        .collect();

    Ok((StatusCode::OK, Json(rows)))
}

pub async fn add_choice(
    Extension(app_state): Extension<AppState>,
    Path(evaluation_id): Path<Uuid>,
    Json(payload): Json<ChoiceInput>,
) -> Result<impl IntoResponse, ApiError> {
    require_text("choice_text", &payload.choice_text)?;
    let choice = app_state.store.add_choice(evaluation_id, payload).await?;
    Ok((StatusCode::CREATED, Json(choice)))
}

pub async fn choice_detail(
    Extension(app_state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let store = app_state.store.as_ref();
    let choice = store
        .get_choice(id)
        .await?
        .ok_or_else(|| StoreError::not_found("choice", id))?;
    let tally = ChoiceTally {
        percentage: choice_percentage(store, &choice).await?,
        choice,
    };
    Ok((StatusCode::OK, Json(tally)))
}

pub async fn update_choice(
    Extension(app_state): Extension<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChoiceInput>,
) -> Result<impl IntoResponse, ApiError> {
    require_text("choice_text", &payload.choice_text)?;
    let store = app_state.store.as_ref();
    let choice = store.update_choice(id, payload).await?;
    let tally = ChoiceTally {
        percentage: choice_percentage(store, &choice).await?,
        choice,
    };
    Ok((StatusCode::OK, Json(tally)))
}

pub async fn delete_choice(
    Extension(app_state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state.store.delete_choice(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
