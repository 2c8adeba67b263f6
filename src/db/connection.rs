use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;

pub type DbPool = Pool<Postgres>;

pub async fn init_db(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .max_lifetime(Duration::from_secs(30 * 60))
        .idle_timeout(Duration::from_secs(10 * 60))
        .connect(database_url)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS vehicles (
            id UUID PRIMARY KEY,
            license_plate VARCHAR(20) NOT NULL UNIQUE,
            brand VARCHAR(50) NOT NULL,
            model VARCHAR(50) NOT NULL,
            year INT NOT NULL,
            vehicle_type VARCHAR(20) NOT NULL,
            fuel_type VARCHAR(20) NOT NULL,
            color VARCHAR(30) NOT NULL,
            owner_name VARCHAR(100) NOT NULL,
            owner_phone VARCHAR(20) NOT NULL,
            owner_email VARCHAR(254),
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS maintenance_types (
            id UUID PRIMARY KEY,
            name VARCHAR(100) NOT NULL,
            description TEXT NOT NULL,
            estimated_duration_secs BIGINT NOT NULL,
            base_price NUMERIC(10, 2) NOT NULL,
            is_active BOOLEAN NOT NULL DEFAULT TRUE
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS maintenances (
            id UUID PRIMARY KEY,
            vehicle_id UUID NOT NULL REFERENCES vehicles(id) ON DELETE CASCADE,
            maintenance_type_id UUID NOT NULL REFERENCES maintenance_types(id) ON DELETE CASCADE,
            scheduled_date TIMESTAMP WITH TIME ZONE NOT NULL,
            start_date TIMESTAMP WITH TIME ZONE,
            completion_date TIMESTAMP WITH TIME ZONE,
            status VARCHAR(20) NOT NULL DEFAULT 'scheduled',
            description TEXT NOT NULL DEFAULT '',
            cost NUMERIC(10, 2),
            notes TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS service_evaluations (
            id UUID PRIMARY KEY,
            maintenance_id UUID NOT NULL UNIQUE REFERENCES maintenances(id) ON DELETE CASCADE,
            question_text VARCHAR(200) NOT NULL,
            pub_date TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT CURRENT_TIMESTAMP,
            is_active BOOLEAN NOT NULL DEFAULT TRUE
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS evaluation_choices (
            id UUID PRIMARY KEY,
            evaluation_id UUID NOT NULL REFERENCES service_evaluations(id) ON DELETE CASCADE,
            choice_text VARCHAR(200) NOT NULL,
            votes INT NOT NULL DEFAULT 0 CHECK (votes >= 0),
            position BIGSERIAL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_vehicles_created_at ON vehicles(created_at)",
        "CREATE INDEX IF NOT EXISTS idx_maintenances_vehicle_id ON maintenances(vehicle_id)",
        "CREATE INDEX IF NOT EXISTS idx_maintenances_type_id ON maintenances(maintenance_type_id)",
        "CREATE INDEX IF NOT EXISTS idx_maintenances_status_scheduled ON maintenances(status, scheduled_date)",
        "CREATE INDEX IF NOT EXISTS idx_service_evaluations_pub_date ON service_evaluations(pub_date)",
        "CREATE INDEX IF NOT EXISTS idx_evaluation_choices_evaluation_id ON evaluation_choices(evaluation_id)",
    ] {
        sqlx::query(statement).execute(&pool).await?;
    }

    Ok(pool)
}

pub fn pool_stats(pool: &DbPool) -> String {
    let size = pool.size() as usize;
    let num_idle = pool.num_idle();
    format!(
        "Pool stats: size={}, idle={}, available={}",
        size,
        num_idle,
        size.saturating_sub(num_idle)
    )
}
