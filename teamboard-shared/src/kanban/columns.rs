/// Column operations
///
/// Every operation that changes column positions locks the board row first,
/// plans with [`super::ordering`], and applies the plan in one transaction.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::error::KanbanError;
use super::ordering::{plan_column_insert, plan_remove, validate_permutation, InsertAt, Placement};
use crate::models::board::Board;
use crate::models::card::Card;
use crate::models::column::{Column, ColumnRole, InsertColumn, UpdateColumn};

/// Input for creating a column
#[derive(Debug, Clone, Default)]
pub struct NewColumn {
    pub name: String,
    pub color: Option<String>,
    pub role: Option<ColumnRole>,
    pub placement: Placement,
}

pub(crate) fn validate_name(name: &str) -> Result<&str, KanbanError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(KanbanError::validation("name must not be empty"));
    }
    Ok(name)
}

/// Creates a column at the requested placement
///
/// # Errors
///
/// - `NotFound` if the board does not exist
/// - `Validation` if the name is blank or the anchor is not a column of
///   this board
pub async fn create_column(
    pool: &PgPool,
    board_id: Uuid,
    input: NewColumn,
) -> Result<Column, KanbanError> {
    let name = validate_name(&input.name)?;

    let mut tx = pool.begin().await?;

    Board::lock(&mut *tx, board_id)
        .await?
        .ok_or(KanbanError::NotFound("Board"))?;

    let columns = Column::list_by_board(&mut *tx, board_id).await?;
    let count = columns.len() as i32;

    let anchor_position = match input.placement.anchor() {
        Some(anchor_id) => Some(
            columns
                .iter()
                .find(|c| c.id == anchor_id)
                .map(|c| c.position)
                .ok_or_else(|| {
                    KanbanError::validation(format!(
                        "anchor column {} does not belong to this board",
                        anchor_id
                    ))
                })?,
        ),
        None => None,
    };

    let at = match (input.placement, anchor_position) {
        (Placement::Start, _) => InsertAt::Start,
        (Placement::Before { .. }, Some(position)) => InsertAt::Before(position),
        (Placement::After { .. }, Some(position)) => InsertAt::After(position),
        _ => InsertAt::End,
    };

    let slot = plan_column_insert(count, at);
    if let Some(shift) = slot.shift {
        Column::shift_positions(&mut *tx, board_id, shift).await?;
    }

    let column = Column::insert(
        &mut *tx,
        InsertColumn {
            board_id,
            name,
            position: slot.position,
            color: input.color.as_deref(),
            role: input.role.unwrap_or_default(),
        },
    )
    .await?;

    tx.commit().await?;

    info!(
        column_id = %column.id,
        board_id = %board_id,
        position = column.position,
        "Column created"
    );

    Ok(column)
}

/// Updates a column's name, color, or role
///
/// Positions are not touched; use [`reorder_columns`] for that.
pub async fn update_column(
    pool: &PgPool,
    column_id: Uuid,
    mut changes: UpdateColumn,
) -> Result<Column, KanbanError> {
    if let Some(name) = changes.name.take() {
        changes.name = Some(validate_name(&name)?.to_string());
    }

    let column = Column::update(pool, column_id, changes)
        .await?
        .ok_or(KanbanError::NotFound("Column"))?;

    info!(column_id = %column.id, "Column updated");

    Ok(column)
}

/// Deletes an empty column and closes the gap in the board's positions
///
/// # Errors
///
/// - `NotFound` if the column does not exist
/// - `Conflict` if the column still has cards
pub async fn delete_column(pool: &PgPool, column_id: Uuid) -> Result<(), KanbanError> {
    let mut tx = pool.begin().await?;

    let board = Board::find_by_column(&mut *tx, column_id)
        .await?
        .ok_or(KanbanError::NotFound("Column"))?;
    Board::lock(&mut *tx, board.id).await?;

    let column = Column::lock(&mut *tx, column_id)
        .await?
        .ok_or(KanbanError::NotFound("Column"))?;

    let cards = Card::count_in_column(&mut *tx, column_id).await?;
    if cards > 0 {
        return Err(KanbanError::conflict(format!(
            "column '{}' still has {} card(s); move or delete them first",
            column.name, cards
        )));
    }

    Column::delete(&mut *tx, column_id).await?;
    Column::shift_positions(&mut *tx, column.board_id, plan_remove(column.position)).await?;

    tx.commit().await?;

    info!(column_id = %column_id, board_id = %column.board_id, "Column deleted");

    Ok(())
}

/// Sets every column's position to its index in `ordered_ids`
///
/// `ordered_ids` must be a permutation of the board's columns; otherwise
/// nothing changes.
pub async fn reorder_columns(
    pool: &PgPool,
    board_id: Uuid,
    ordered_ids: &[Uuid],
) -> Result<Vec<Column>, KanbanError> {
    let mut tx = pool.begin().await?;

    Board::lock(&mut *tx, board_id)
        .await?
        .ok_or(KanbanError::NotFound("Board"))?;

    let current: Vec<Uuid> = Column::list_by_board(&mut *tx, board_id)
        .await?
        .into_iter()
        .map(|c| c.id)
        .collect();

    validate_permutation(&current, ordered_ids).map_err(KanbanError::Validation)?;

    for (index, id) in ordered_ids.iter().enumerate() {
        Column::set_position(&mut *tx, *id, index as i32).await?;
    }

    let columns = Column::list_by_board(&mut *tx, board_id).await?;

    tx.commit().await?;

    info!(board_id = %board_id, columns = columns.len(), "Columns reordered");

    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name_trims() {
        assert_eq!(validate_name("  Review ").unwrap(), "Review");
        assert!(matches!(validate_name("   "), Err(KanbanError::Validation(_))));
    }
}
