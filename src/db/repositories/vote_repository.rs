use super::evaluation_repository::choice_from_row;
use crate::db::connection::DbPool;
use crate::db::models::EvaluationChoice;
use crate::error::StoreError;
use uuid::Uuid;

/// Adds one vote to `choice_id` if it belongs to `evaluation_id`.
///
/// The increment happens inside Postgres, so concurrent votes on the same choice
/// are serialized by the row lock the `UPDATE` takes. Returns `None` when no
/// choice matches.
pub async fn increment_choice_votes(
    pool: &DbPool,
    evaluation_id: Uuid,
    choice_id: Uuid,
) -> Result<Option<EvaluationChoice>, StoreError> {
    let row = sqlx::query(
        "UPDATE evaluation_choices SET votes = votes + 1 \
         WHERE id = $1 AND evaluation_id = $2 \
         RETURNING id, evaluation_id, choice_text, votes",
    )
    .bind(choice_id)
    .bind(evaluation_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(choice_from_row).transpose()
}
