pub mod evaluation_repository;
pub mod maintenance_repository;
pub mod maintenance_type_repository;
pub mod vehicle_repository;
pub mod vote_repository;

pub use evaluation_repository::*;
pub use maintenance_repository::*;
pub use maintenance_type_repository::*;
pub use vehicle_repository::*;
pub use vote_repository::*;

use crate::db::models::UnknownVariant;
use crate::error::StoreError;

/// Maps constraint failures raised by Postgres onto the store's error taxonomy.
///
/// `entity` names the table being written and `value` is the offending unique key
/// as the caller submitted it.
pub(crate) fn write_error(error: sqlx::Error, entity: &'static str, value: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &error {
        if db_err.is_unique_violation() {
            let field = match db_err.constraint() {
                Some("service_evaluations_maintenance_id_key") => "maintenance_id",
                _ => "license_plate",
            };
            debug!("unique violation on {}.{}", entity, field);
            return StoreError::UniquenessViolation {
                entity,
                field,
                value: value.to_string(),
            };
        }
        if db_err.is_foreign_key_violation() {
            let target = match db_err.constraint() {
                Some("maintenances_vehicle_id_fkey") => "vehicle",
                Some("maintenances_maintenance_type_id_fkey") => "maintenance type",
                Some("service_evaluations_maintenance_id_fkey") => "maintenance",
                Some("evaluation_choices_evaluation_id_fkey") => "evaluation",
                _ => "record",
            };
            debug!("foreign key violation on {} -> {}", entity, target);
            return StoreError::ReferentialIntegrity { entity, target };
        }
    }
    StoreError::from(error)
}

pub(crate) fn decode_error(error: UnknownVariant) -> StoreError {
    StoreError::Database(error.to_string())
}

/// Escapes `LIKE` wildcards so user input only ever matches literally.
pub(crate) fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("ABC"), "%ABC%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
