use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{entity} with {field} '{value}' already exists")]
    UniquenessViolation {
        entity: &'static str,
        field: &'static str,
        value: String,
    },
    #[error("{entity} references missing {target}")]
    ReferentialIntegrity {
        entity: &'static str,
        target: &'static str,
    },
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },
    #[error("Database error: {0}")]
    Database(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        StoreError::NotFound { entity, id }
    }
}

#[derive(Error, Debug)]
pub enum VoteError {
    #[error("Evaluation {0} not found")]
    NotFound(Uuid),
    #[error("You did not select a valid option")]
    InvalidChoice,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("APP_PORT must be a valid port number")]
    InvalidPort,
    #[error("{0} must be a positive integer")]
    InvalidNumber(&'static str),
    #[error("APP_HOST '{0}' is not a valid address")]
    InvalidHost(String),
}

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid log filter '{value}'")]
    LogFilter {
        value: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("could not install the tracing subscriber: {0}")]
    Subscriber(String),
    #[error("could not connect to the database: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Error surfaced by HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Vote(#[from] VoteError),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Store(err) | ApiError::Vote(VoteError::Store(err)) => match err {
                StoreError::UniquenessViolation { .. } => StatusCode::CONFLICT,
                StoreError::ReferentialIntegrity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                StoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Vote(VoteError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Vote(VoteError::InvalidChoice) => StatusCode::BAD_REQUEST,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match status {
            StatusCode::CONFLICT => "Conflict",
            StatusCode::UNPROCESSABLE_ENTITY => "Invalid reference",
            StatusCode::NOT_FOUND => "Not found",
            StatusCode::BAD_REQUEST => "Invalid request",
            _ => "Internal server error",
        };

        if status.is_server_error() {
            error!("request failed: {}", self);
        }

        let body = Json(json!({
            "error": error_message,
            "details": self.to_string()
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        StoreError::Database(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_errors_map_to_distinct_statuses() {
        assert_eq!(
            ApiError::from(VoteError::NotFound(Uuid::nil())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(VoteError::InvalidChoice).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn store_errors_map_to_statuses() {
        let duplicate = StoreError::UniquenessViolation {
            entity: "vehicle",
            field: "license_plate",
            value: "ABC123".to_string(),
        };
        assert_eq!(duplicate.to_string(), "vehicle with license_plate 'ABC123' already exists");
        assert_eq!(ApiError::from(duplicate).status(), StatusCode::CONFLICT);

        let dangling = StoreError::ReferentialIntegrity {
            entity: "maintenance",
            target: "vehicle",
        };
        assert_eq!(ApiError::from(dangling).status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            ApiError::from(StoreError::Database("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
