use crate::db::models::{EvaluationChoice, EvaluationFilter, ServiceEvaluation};
use crate::db::store::EntityStore;
use crate::domain::{self, EvaluationResults};
use crate::error::{ApiError, StoreError};
use crate::startup::AppState;
use axum::{
    extract::{Extension, Form, FromRequest, Json, Path, Request},
    http::{StatusCode, header::CONTENT_TYPE},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

const LATEST_EVALUATIONS: i64 = 10;

#[derive(Debug, Serialize)]
pub struct EvaluationSummary {
    #[serde(flatten)]
    pub evaluation: ServiceEvaluation,
    pub was_published_recently: bool,
}

#[derive(Debug, Serialize)]
pub struct EvaluationDetailResponse {
    #[serde(flatten)]
    pub evaluation: ServiceEvaluation,
    pub choices: Vec<EvaluationChoice>,
}

/// Vote payload, JSON or urlencoded form. `choice` stays loosely typed so that a
/// missing, mistyped or malformed selection ends up as no selection at all.
#[derive(Debug, Default, Deserialize)]
pub struct CastVoteRequest {
    #[serde(default)]
    pub choice: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct CastVoteForm {
    #[serde(default)]
    choice: Option<String>,
}

fn is_form(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"))
}

/// Reads the selected choice id from the body. Anything unusable is `None`.
async fn submitted_choice(request: Request) -> Option<Uuid> {
    let raw = (if is_form(&request) {
        Form::<CastVoteForm>::from_request(request, &())
            .await
            .inspect_err(|err| debug!("unreadable vote form: {}", err))
            .ok()
            .and_then(|Form(form)| form.choice)
    } else {
        match Json::<CastVoteRequest>::from_request(request, &()).await {
            Ok(Json(CastVoteRequest {
                choice: Some(Value::String(raw)),
            })) => Some(raw),
            Ok(Json(payload)) => {
                debug!("vote choice is not a string: {:?}", payload.choice);
                None
            }
            Err(err) => {
                debug!("unreadable vote body: {}", err);
                None
            }
        }
    })?;

    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<Uuid>()
        .inspect_err(|_| debug!("malformed choice id '{}'", raw))
        .ok()
}

/// Active, already-published evaluation or `NotFound`.
async fn visible_evaluation(
    store: &dyn EntityStore,
    evaluation_id: Uuid,
    now: DateTime<Utc>,
) -> Result<ServiceEvaluation, ApiError> {
    store
        .get_evaluation(evaluation_id)
        .await?
        .filter(|e| e.is_visible(now))
        .ok_or_else(|| StoreError::not_found("evaluation", evaluation_id).into())
}

/// Latest active evaluations that are already published
pub async fn list_evaluations(
    Extension(app_state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let now = Utc::now();
    let evaluations: Vec<EvaluationSummary> = app_state
        .store
        .list_evaluations(&EvaluationFilter {
            active_only: true,
            published_until: Some(now),
            limit: Some(LATEST_EVALUATIONS),
        })
        .await?
        .into_iter()
        .map(|evaluation| EvaluationSummary {
            was_published_recently: evaluation.was_published_recently(now),
            evaluation,
        })
        .collect();

    Ok((StatusCode::OK, Json(evaluations)))
}

pub async fn evaluation_detail(
    Extension(app_state): Extension<AppState>,
    Path(evaluation_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let store = app_state.store.as_ref();
    let evaluation = visible_evaluation(store, evaluation_id, Utc::now()).await?;
    let choices = store.list_choices(evaluation_id).await?;

    Ok((
        StatusCode::OK,
        Json(EvaluationDetailResponse {
            evaluation,
            choices,
        }),
    ))
}

/// Vote counts with each choice's share of the total
pub async fn evaluation_results(
    Extension(app_state): Extension<AppState>,
    Path(evaluation_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let store = app_state.store.as_ref();
    let now = Utc::now();
    let evaluation = visible_evaluation(store, evaluation_id, now).await?;
    let choices = store.list_choices(evaluation_id).await?;

    Ok((
        StatusCode::OK,
        Json(EvaluationResults::tally(evaluation, choices, now)),
    ))
}

/// Cast a vote and answer with the updated results
pub async fn vote_on_evaluation(
    Extension(app_state): Extension<AppState>,
    Path(evaluation_id): Path<Uuid>,
    request: Request,
) -> Result<impl IntoResponse, ApiError> {
    let store = app_state.store.as_ref();
    let choice_id = submitted_choice(request).await;

    domain::vote(store, evaluation_id, choice_id).await?;

    let results = domain::load_results(store, evaluation_id, Utc::now())
        .await?
        .ok_or_else(|| StoreError::not_found("evaluation", evaluation_id))?;

    Ok((StatusCode::OK, Json(results)))
}
