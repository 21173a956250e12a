/// Move/history recorder
///
/// Moving a card to another column and appending its history record happen
/// in one transaction: either both are committed or neither is. Moves within
/// a column only reorder and never produce history.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::cards::{lock_card_in, lock_columns};
use super::error::KanbanError;
use super::ordering::{plan_insert, plan_move_within, plan_remove};
use crate::models::card::Card;
use crate::models::card_history::CardHistory;
use crate::models::column::Column;

/// Moves a card to `target_column_id` at `order`
///
/// Within the same column, `order` defaults to the current position and is
/// clamped to the column's last position. Across columns, `order` defaults to
/// the end of the target column and is clamped to `0..=count`; the move is
/// recorded with the source and target column names.
///
/// # Errors
///
/// - `NotFound` if the card or target column does not exist
/// - `Validation` if the target column belongs to a different board
///
/// # Example
///
/// ```no_run
/// use teamboard_shared::kanban::move_card;
/// # use sqlx::PgPool;
/// # use uuid::Uuid;
///
/// # async fn example(pool: PgPool, card_id: Uuid, done_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let card = move_card(&pool, card_id, done_id, None).await?;
/// assert_eq!(card.column_id, done_id);
/// # Ok(())
/// # }
/// ```
pub async fn move_card(
    pool: &PgPool,
    card_id: Uuid,
    target_column_id: Uuid,
    order: Option<i32>,
) -> Result<Card, KanbanError> {
    let mut tx = pool.begin().await?;

    let current = Card::find_by_id(&mut *tx, card_id)
        .await?
        .ok_or(KanbanError::NotFound("Card"))?;
    Column::find_by_id(&mut *tx, target_column_id)
        .await?
        .ok_or(KanbanError::NotFound("Column"))?;

    let source_id = current.column_id;

    if source_id == target_column_id {
        lock_columns(&mut tx, &[source_id]).await?;
        let card = lock_card_in(&mut tx, card_id, source_id).await?;

        let count = Card::count_in_column(&mut *tx, source_id).await?;
        let slot = plan_move_within(card.position, order, count);

        if let Some(shift) = slot.shift {
            Card::shift_positions(&mut *tx, source_id, shift, Some(card.id)).await?;
        }
        let moved = Card::relocate(&mut *tx, card.id, source_id, slot.position)
            .await?
            .ok_or(KanbanError::NotFound("Card"))?;

        tx.commit().await?;

        info!(
            card_id = %moved.id,
            column_id = %source_id,
            from_position = card.position,
            to_position = moved.position,
            "Card reordered"
        );

        return Ok(moved);
    }

    let locked = lock_columns(&mut tx, &[source_id, target_column_id]).await?;
    let (source, target) = (&locked[0], &locked[1]);

    if source.board_id != target.board_id {
        return Err(KanbanError::validation(
            "cards can only move between columns of the same board",
        ));
    }

    let card = lock_card_in(&mut tx, card_id, source.id).await?;

    Card::shift_positions(&mut *tx, source.id, plan_remove(card.position), None).await?;

    let count = Card::count_in_column(&mut *tx, target.id).await?;
    let slot = plan_insert(count, order);
    if let Some(shift) = slot.shift {
        Card::shift_positions(&mut *tx, target.id, shift, None).await?;
    }

    let moved = Card::relocate(&mut *tx, card.id, target.id, slot.position)
        .await?
        .ok_or(KanbanError::NotFound("Card"))?;

    let entry = CardHistory::append(&mut *tx, card.id, &source.name, &target.name).await?;

    tx.commit().await?;

    info!(
        card_id = %moved.id,
        from = %entry.from_column,
        to = %entry.to_column,
        position = moved.position,
        "Card moved"
    );

    Ok(moved)
}
