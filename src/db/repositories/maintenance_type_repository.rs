use super::write_error;
use crate::db::connection::DbPool;
use crate::db::models::{MaintenanceType, MaintenanceTypeInput, money};
use crate::error::StoreError;
use chrono::Duration;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

const TYPE_COLUMNS: &str = "id, name, description, estimated_duration_secs, base_price, is_active";

fn maintenance_type_from_row(row: &PgRow) -> Result<MaintenanceType, StoreError> {
    let secs: i64 = row.try_get("estimated_duration_secs")?;
    Ok(MaintenanceType {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        estimated_duration: Duration::try_seconds(secs)
            .ok_or_else(|| StoreError::Database(format!("duration {secs}s out of range")))?,
        base_price: row.try_get("base_price")?,
        is_active: row.try_get("is_active")?,
    })
}

pub async fn create_maintenance_type(
    pool: &DbPool,
    input: &MaintenanceTypeInput,
) -> Result<MaintenanceType, StoreError> {
    let row = sqlx::query(&format!(
        "INSERT INTO maintenance_types ({TYPE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING {TYPE_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&input.name)
    .bind(&input.description)
    .bind(input.estimated_duration.num_seconds())
    .bind(money(input.base_price))
    .bind(input.is_active)
    .fetch_one(pool)
    .await
    .map_err(|e| write_error(e, "maintenance type", &input.name))?;

    maintenance_type_from_row(&row)
}

pub async fn update_maintenance_type(
    pool: &DbPool,
    id: Uuid,
    input: &MaintenanceTypeInput,
) -> Result<MaintenanceType, StoreError> {
    let row = sqlx::query(&format!(
        "UPDATE maintenance_types SET name = $2, description = $3, estimated_duration_secs = $4, \
         base_price = $5, is_active = $6 WHERE id = $1 RETURNING {TYPE_COLUMNS}"
    ))
    .bind(id)
    .bind(&input.name)
    .bind(&input.description)
    .bind(input.estimated_duration.num_seconds())
    .bind(money(input.base_price))
    .bind(input.is_active)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| StoreError::not_found("maintenance type", id))?;

    maintenance_type_from_row(&row)
}

pub async fn delete_maintenance_type(pool: &DbPool, id: Uuid) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM maintenance_types WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::not_found("maintenance type", id));
    }
    Ok(())
}

pub async fn get_maintenance_type(
    pool: &DbPool,
    id: Uuid,
) -> Result<Option<MaintenanceType>, StoreError> {
    let row = sqlx::query(&format!(
        "SELECT {TYPE_COLUMNS} FROM maintenance_types WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(maintenance_type_from_row).transpose()
}

pub async fn list_maintenance_types(
    pool: &DbPool,
    active_only: bool,
) -> Result<Vec<MaintenanceType>, StoreError> {
    let rows = sqlx::query(&format!(
        "SELECT {TYPE_COLUMNS} FROM maintenance_types WHERE ($1 = FALSE OR is_active) ORDER BY name"
    ))
    .bind(active_only)
    .fetch_all(pool)
    .await?;

    rows.iter().map(maintenance_type_from_row).collect()
}

pub async fn count_maintenance_types(pool: &DbPool) -> Result<i64, StoreError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM maintenance_types")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
