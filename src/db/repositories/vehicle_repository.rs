use super::{decode_error, like_pattern, write_error};
use crate::db::connection::DbPool;
use crate::db::models::{Vehicle, VehicleFilter, VehicleInput};
use crate::error::StoreError;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Postgres, QueryBuilder, Row};
use uuid::Uuid;

const VEHICLE_COLUMNS: &str = "id, license_plate, brand, model, year, vehicle_type, fuel_type, \
     color, owner_name, owner_phone, owner_email, created_at";

fn vehicle_from_row(row: &PgRow) -> Result<Vehicle, StoreError> {
    Ok(Vehicle {
        id: row.try_get("id")?,
        license_plate: row.try_get("license_plate")?,
        brand: row.try_get("brand")?,
        model: row.try_get("model")?,
        year: row.try_get("year")?,
        vehicle_type: row
            .try_get::<String, _>("vehicle_type")?
            .parse()
            .map_err(decode_error)?,
        fuel_type: row
            .try_get::<String, _>("fuel_type")?
            .parse()
            .map_err(decode_error)?,
        color: row.try_get("color")?,
        owner_name: row.try_get("owner_name")?,
        owner_phone: row.try_get("owner_phone")?,
        owner_email: row.try_get("owner_email")?,
        created_at: row.try_get("created_at")?,
    })
}

pub async fn create_vehicle(pool: &DbPool, input: &VehicleInput) -> Result<Vehicle, StoreError> {
    let row = sqlx::query(&format!(
        "INSERT INTO vehicles ({VEHICLE_COLUMNS}) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         RETURNING {VEHICLE_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&input.license_plate)
    .bind(&input.brand)
    .bind(&input.model)
    .bind(input.year)
    .bind(input.vehicle_type.as_str())
    .bind(input.fuel_type.as_str())
    .bind(&input.color)
    .bind(&input.owner_name)
    .bind(&input.owner_phone)
    .bind(&input.owner_email)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .map_err(|e| write_error(e, "vehicle", &input.license_plate))?;

    vehicle_from_row(&row)
}

/// Replaces every editable field; `created_at` is never touched.
pub async fn update_vehicle(
    pool: &DbPool,
    id: Uuid,
    input: &VehicleInput,
) -> Result<Vehicle, StoreError> {
    let row = sqlx::query(&format!(
        "UPDATE vehicles SET license_plate = $2, brand = $3, model = $4, year = $5, \
         vehicle_type = $6, fuel_type = $7, color = $8, owner_name = $9, owner_phone = $10, \
         owner_email = $11 WHERE id = $1 RETURNING {VEHICLE_COLUMNS}"
    ))
    .bind(id)
    .bind(&input.license_plate)
    .bind(&input.brand)
    .bind(&input.model)
    .bind(input.year)
    .bind(input.vehicle_type.as_str())
    .bind(input.fuel_type.as_str())
    .bind(&input.color)
    .bind(&input.owner_name)
    .bind(&input.owner_phone)
    .bind(&input.owner_email)
    .fetch_optional(pool)
    .await
    .map_err(|e| write_error(e, "vehicle", &input.license_plate))?
    .ok_or_else(|| StoreError::not_found("vehicle", id))?;

    vehicle_from_row(&row)
}

/// Deleting a vehicle cascades to its maintenances and, through them, to their evaluations.
pub async fn delete_vehicle(pool: &DbPool, id: Uuid) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::not_found("vehicle", id));
    }
    Ok(())
}

pub async fn get_vehicle(pool: &DbPool, id: Uuid) -> Result<Option<Vehicle>, StoreError> {
    let row = sqlx::query(&format!("SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(vehicle_from_row).transpose()
}

pub async fn list_vehicles(
    pool: &DbPool,
    filter: &VehicleFilter,
) -> Result<Vec<Vehicle>, StoreError> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {VEHICLE_COLUMNS} FROM vehicles"));

    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        builder
            .push(" WHERE license_plate ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR brand ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR model ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR owner_name ILIKE ")
            .push_bind(pattern);
    }

    builder.push(" ORDER BY created_at DESC");
    if let Some(limit) = filter.limit {
        builder.push(" LIMIT ").push_bind(limit);
    }

    let rows = builder.build().fetch_all(pool).await?;
    rows.iter().map(vehicle_from_row).collect()
}

pub async fn count_vehicles(pool: &DbPool) -> Result<i64, StoreError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM vehicles")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
