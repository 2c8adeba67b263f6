use crate::config::AppConfig;
use crate::error::StartupError;
use crate::startup::{AppState, router};

#[macro_use]
extern crate tracing;

mod admin;
mod config;
mod dashboard;
mod db;
mod domain;
mod error;
mod evaluations;
mod maintenances;
mod startup;
mod telemetry;
mod vehicles;

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.log_level)?;

    let app_state = AppState::from_config(&config).await?;
    let app = router(app_state);

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
