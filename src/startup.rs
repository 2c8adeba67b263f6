use crate::config::{AppConfig, SiteConfig};
use crate::db::connection::{init_db, pool_stats};
use crate::db::memory::MemoryStore;
use crate::db::store::{EntityStore, PgStore};
use crate::{admin, dashboard, evaluations, maintenances, vehicles};
use axum::{
    Router,
    extract::Extension,
    http::{
        StatusCode,
        header::{ACCEPT, CONTENT_TYPE},
    },
    response::IntoResponse,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
    pub site: Arc<SiteConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn EntityStore>, site: SiteConfig) -> Self {
        AppState {
            store,
            site: Arc::new(site),
        }
    }

    /// Connects to Postgres when a database URL is configured, otherwise falls
    /// back to a process-local store.
    pub async fn from_config(config: &AppConfig) -> Result<Self, sqlx::Error> {
        let store: Arc<dyn EntityStore> = match &config.database_url {
            Some(url) => {
                let pool = init_db(url, config.max_connections).await?;
                info!("{}", pool_stats(&pool));
                Arc::new(PgStore::new(pool))
            }
            None => {
                warn!("DATABASE_URL not set; using the in-memory store, data will not persist");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(AppState::new(store, config.site.clone()))
    }
}

pub fn router(app_state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/", get(admin::index))
        .route("/vehicles", post(admin::create_vehicle))
        .route(
            "/vehicles/:id",
            put(admin::update_vehicle).delete(admin::delete_vehicle),
        )
        .route(
            "/maintenance-types",
            get(admin::list_maintenance_types).post(admin::create_maintenance_type),
        )
        .route(
            "/maintenance-types/:id",
            put(admin::update_maintenance_type).delete(admin::delete_maintenance_type),
        )
        .route("/maintenances", post(admin::create_maintenance))
        .route(
            "/maintenances/:id",
            put(admin::update_maintenance).delete(admin::delete_maintenance),
        )
        .route(
            "/evaluations",
            get(admin::list_evaluations).post(admin::create_evaluation),
        )
        .route(
            "/evaluations/:id",
            put(admin::update_evaluation).delete(admin::delete_evaluation),
        )
        .route(
            "/evaluations/:id/choices",
            get(admin::list_choices).post(admin::add_choice),
        )
        .route(
            "/choices/:id",
            get(admin::choice_detail)
                .put(admin::update_choice)
                .delete(admin::delete_choice),
        );

    Router::new()
        .route("/", get(dashboard::dashboard))
        .route("/vehicles", get(vehicles::list_vehicles))
        .route("/vehicles/:id", get(vehicles::vehicle_detail))
        .route("/maintenances", get(maintenances::list_maintenances))
        .route("/maintenances/:id", get(maintenances::maintenance_detail))
        .route("/evaluations", get(evaluations::list_evaluations))
        .route("/evaluations/:id", get(evaluations::evaluation_detail))
        .route("/evaluations/:id/results", get(evaluations::evaluation_results))
        .route("/evaluations/:id/vote", post(evaluations::vote_on_evaluation))
        .nest("/admin", admin_routes)
        .layer(Extension(app_state))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::mirror_request())
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PUT,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([CONTENT_TYPE, ACCEPT]),
        )
        .layer(TraceLayer::new_for_http())
        .fallback(handler_404)
}

async fn handler_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "nothing to see here")
}
