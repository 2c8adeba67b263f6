use super::write_error;
use crate::db::connection::DbPool;
use crate::db::models::{
    ChoiceInput, EvaluationChoice, EvaluationFilter, EvaluationInput, ServiceEvaluation,
};
use crate::error::StoreError;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Postgres, QueryBuilder, Row};
use uuid::Uuid;

const EVALUATION_COLUMNS: &str = "id, maintenance_id, question_text, pub_date, is_active";
const CHOICE_COLUMNS: &str = "id, evaluation_id, choice_text, votes";

fn evaluation_from_row(row: &PgRow) -> Result<ServiceEvaluation, StoreError> {
    Ok(ServiceEvaluation {
        id: row.try_get("id")?,
        maintenance_id: row.try_get("maintenance_id")?,
        question_text: row.try_get("question_text")?,
        pub_date: row.try_get("pub_date")?,
        is_active: row.try_get("is_active")?,
    })
}

pub(crate) fn choice_from_row(row: &PgRow) -> Result<EvaluationChoice, StoreError> {
    Ok(EvaluationChoice {
        id: row.try_get("id")?,
        evaluation_id: row.try_get("evaluation_id")?,
        choice_text: row.try_get("choice_text")?,
        votes: row.try_get("votes")?,
    })
}

pub async fn create_evaluation(
    pool: &DbPool,
    input: &EvaluationInput,
) -> Result<ServiceEvaluation, StoreError> {
    let row = sqlx::query(&format!(
        "INSERT INTO service_evaluations ({EVALUATION_COLUMNS}) VALUES ($1, $2, $3, $4, $5) \
         RETURNING {EVALUATION_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(input.maintenance_id)
    .bind(&input.question_text)
    .bind(input.pub_date.unwrap_or_else(Utc::now))
    .bind(input.is_active)
    .fetch_one(pool)
    .await
    .map_err(|e| write_error(e, "evaluation", &input.maintenance_id.to_string()))?;

    evaluation_from_row(&row)
}

pub async fn update_evaluation(
    pool: &DbPool,
    id: Uuid,
    input: &EvaluationInput,
) -> Result<ServiceEvaluation, StoreError> {
    let row = sqlx::query(&format!(
        "UPDATE service_evaluations SET maintenance_id = $2, question_text = $3, \
         pub_date = COALESCE($4, pub_date), is_active = $5 WHERE id = $1 \
         RETURNING {EVALUATION_COLUMNS}"
    ))
    .bind(id)
    .bind(input.maintenance_id)
    .bind(&input.question_text)
    .bind(input.pub_date)
    .bind(input.is_active)
    .fetch_optional(pool)
    .await
    .map_err(|e| write_error(e, "evaluation", &input.maintenance_id.to_string()))?
    .ok_or_else(|| StoreError::not_found("evaluation", id))?;

    evaluation_from_row(&row)
}

pub async fn delete_evaluation(pool: &DbPool, id: Uuid) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM service_evaluations WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::not_found("evaluation", id));
    }
    Ok(())
}

pub async fn get_evaluation(
    pool: &DbPool,
    id: Uuid,
) -> Result<Option<ServiceEvaluation>, StoreError> {
    let row = sqlx::query(&format!(
        "SELECT {EVALUATION_COLUMNS} FROM service_evaluations WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(evaluation_from_row).transpose()
}

pub async fn get_evaluation_for_maintenance(
    pool: &DbPool,
    maintenance_id: Uuid,
) -> Result<Option<ServiceEvaluation>, StoreError> {
    let row = sqlx::query(&format!(
        "SELECT {EVALUATION_COLUMNS} FROM service_evaluations WHERE maintenance_id = $1"
    ))
    .bind(maintenance_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(evaluation_from_row).transpose()
}

pub async fn list_evaluations(
    pool: &DbPool,
    filter: &EvaluationFilter,
) -> Result<Vec<ServiceEvaluation>, StoreError> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
        "SELECT {EVALUATION_COLUMNS} FROM service_evaluations WHERE TRUE"
    ));
    if filter.active_only {
        builder.push(" AND is_active");
    }
    if let Some(until) = filter.published_until {
        builder.push(" AND pub_date <= ").push_bind(until);
    }
    builder.push(" ORDER BY pub_date DESC");
    if let Some(limit) = filter.limit {
        builder.push(" LIMIT ").push_bind(limit);
    }

    let rows = builder.build().fetch_all(pool).await?;
    rows.iter().map(evaluation_from_row).collect()
}

pub async fn count_evaluations(pool: &DbPool) -> Result<i64, StoreError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM service_evaluations")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// New choices always start at zero votes.
pub async fn add_choice(
    pool: &DbPool,
    evaluation_id: Uuid,
    input: &ChoiceInput,
) -> Result<EvaluationChoice, StoreError> {
    let row = sqlx::query(&format!(
        "INSERT INTO evaluation_choices (id, evaluation_id, choice_text) VALUES ($1, $2, $3) \
         RETURNING {CHOICE_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(evaluation_id)
    .bind(&input.choice_text)
    .fetch_one(pool)
    .await
    .map_err(|e| write_error(e, "choice", &input.choice_text))?;

    choice_from_row(&row)
}

pub async fn update_choice(
    pool: &DbPool,
    id: Uuid,
    input: &ChoiceInput,
) -> Result<EvaluationChoice, StoreError> {
    let row = sqlx::query(&format!(
        "UPDATE evaluation_choices SET choice_text = $2 WHERE id = $1 RETURNING {CHOICE_COLUMNS}"
    ))
    .bind(id)
    .bind(&input.choice_text)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| StoreError::not_found("choice", id))?;

    choice_from_row(&row)
}

pub async fn delete_choice(pool: &DbPool, id: Uuid) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM evaluation_choices WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::not_found("choice", id));
    }
    Ok(())
}

pub async fn get_choice(pool: &DbPool, id: Uuid) -> Result<Option<EvaluationChoice>, StoreError> {
    let row = sqlx::query(&format!(
        "SELECT {CHOICE_COLUMNS} FROM evaluation_choices WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(choice_from_row).transpose()
}

pub async fn list_choices(
    pool: &DbPool,
    evaluation_id: Uuid,
) -> Result<Vec<EvaluationChoice>, StoreError> {
    let rows = sqlx::query(&format!(
        "SELECT {CHOICE_COLUMNS} FROM evaluation_choices WHERE evaluation_id = $1 ORDER BY position"
    ))
    .bind(evaluation_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(choice_from_row).collect()
}
