use super::{decode_error, write_error};
use crate::db::connection::DbPool;
use crate::db::models::{
    Maintenance, MaintenanceFilter, MaintenanceInput, MaintenanceOrder, money,
};
use crate::error::StoreError;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Postgres, QueryBuilder, Row};
use uuid::Uuid;

const MAINTENANCE_COLUMNS: &str = "id, vehicle_id, maintenance_type_id, scheduled_date, \
     start_date, completion_date, status, description, cost, notes, created_at, updated_at";

fn maintenance_from_row(row: &PgRow) -> Result<Maintenance, StoreError> {
    Ok(Maintenance {
        id: row.try_get("id")?,
        vehicle_id: row.try_get("vehicle_id")?,
        maintenance_type_id: row.try_get("maintenance_type_id")?,
        scheduled_date: row.try_get("scheduled_date")?,
        start_date: row.try_get("start_date")?,
        completion_date: row.try_get("completion_date")?,
        status: row
            .try_get::<String, _>("status")?
            .parse()
            .map_err(decode_error)?,
        description: row.try_get("description")?,
        cost: row.try_get("cost")?,
        notes: row.try_get("notes")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &MaintenanceFilter) {
    builder.push(" WHERE TRUE");
    if let Some(vehicle_id) = filter.vehicle_id {
        builder.push(" AND vehicle_id = ").push_bind(vehicle_id);
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(from) = filter.scheduled_from {
        builder.push(" AND scheduled_date >= ").push_bind(from);
    }
    if let Some(before) = filter.scheduled_before {
        builder.push(" AND scheduled_date < ").push_bind(before);
    }
    if let Some(since) = filter.completed_since {
        builder.push(" AND completion_date >= ").push_bind(since);
    }
}

pub async fn create_maintenance(
    pool: &DbPool,
    input: &MaintenanceInput,
) -> Result<Maintenance, StoreError> {
    let now = Utc::now();
    let row = sqlx::query(&format!(
        "INSERT INTO maintenances ({MAINTENANCE_COLUMNS}) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11) \
         RETURNING {MAINTENANCE_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(input.vehicle_id)
    .bind(input.maintenance_type_id)
    .bind(input.scheduled_date)
    .bind(input.start_date)
    .bind(input.completion_date)
    .bind(input.status.as_str())
    .bind(&input.description)
    .bind(input.cost.map(money))
    .bind(&input.notes)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| write_error(e, "maintenance", &input.vehicle_id.to_string()))?;

    maintenance_from_row(&row)
}

/// Replaces every editable field and refreshes `updated_at`.
pub async fn update_maintenance(
    pool: &DbPool,
    id: Uuid,
    input: &MaintenanceInput,
) -> Result<Maintenance, StoreError> {
    let row = sqlx::query(&format!(
        "UPDATE maintenances SET vehicle_id = $2, maintenance_type_id = $3, scheduled_date = $4, \
         start_date = $5, completion_date = $6, status = $7, description = $8, cost = $9, \
         notes = $10, updated_at = $11 WHERE id = $1 RETURNING {MAINTENANCE_COLUMNS}"
    ))
    .bind(id)
    .bind(input.vehicle_id)
    .bind(input.maintenance_type_id)
    .bind(input.scheduled_date)
    .bind(input.start_date)
    .bind(input.completion_date)
    .bind(input.status.as_str())
    .bind(&input.description)
    .bind(input.cost.map(money))
    .bind(&input.notes)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await
    .map_err(|e| write_error(e, "maintenance", &id.to_string()))?
    .ok_or_else(|| StoreError::not_found("maintenance", id))?;

    maintenance_from_row(&row)
}

pub async fn delete_maintenance(pool: &DbPool, id: Uuid) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM maintenances WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::not_found("maintenance", id));
    }
    Ok(())
}

pub async fn get_maintenance(pool: &DbPool, id: Uuid) -> Result<Option<Maintenance>, StoreError> {
    let row = sqlx::query(&format!(
        "SELECT {MAINTENANCE_COLUMNS} FROM maintenances WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(maintenance_from_row).transpose()
}

pub async fn list_maintenances(
    pool: &DbPool,
    filter: &MaintenanceFilter,
) -> Result<Vec<Maintenance>, StoreError> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {MAINTENANCE_COLUMNS} FROM maintenances"));
    push_filter(&mut builder, filter);

    builder.push(match filter.order {
        MaintenanceOrder::NewestFirst => " ORDER BY scheduled_date DESC",
        MaintenanceOrder::SoonestFirst => " ORDER BY scheduled_date ASC",
    });
    if let Some(limit) = filter.limit {
        builder.push(" LIMIT ").push_bind(limit);
    }

    let rows = builder.build().fetch_all(pool).await?;
    rows.iter().map(maintenance_from_row).collect()
}

/// Counts rows matching `filter`; ordering and limit are ignored.
pub async fn count_maintenances(
    pool: &DbPool,
    filter: &MaintenanceFilter,
) -> Result<i64, StoreError> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM maintenances");
    push_filter(&mut builder, filter);

    let count = builder
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await?;

    Ok(count)
}
