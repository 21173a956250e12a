/// Card operations
///
/// Locking order for card mutations is: the affected column rows (sorted by
/// id), then the card row. Sibling shifts only touch cards of locked columns.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use super::error::KanbanError;
use crate::db::pool::begin_snapshot;
use super::ordering::{plan_insert, plan_remove};
use crate::models::board::Board;
use crate::models::card::{Card, InsertCard, Priority, UpdateCard};
use crate::models::card_history::CardHistory;
use crate::models::column::Column;
use crate::models::membership::TeamMember;
use crate::models::user::{User, UserSummary};

/// Input for creating a card
#[derive(Debug, Clone, Default)]
pub struct NewCard {
    pub column_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub assignee_id: Option<Uuid>,

    /// Requested position; appended when `None`
    pub order: Option<i32>,
}

/// Card with its assignee and history
#[derive(Debug, Clone, Serialize)]
pub struct CardDetail {
    #[serde(flatten)]
    pub card: Card,
    pub assignee: Option<UserSummary>,
    pub history: Vec<CardHistory>,
}

fn validate_title(title: &str) -> Result<String, KanbanError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(KanbanError::validation("title must not be empty"));
    }
    Ok(title.to_string())
}

/// Fails unless `user_id` belongs to the team
///
/// The membership stays share-locked until the caller commits, so the
/// member cannot be removed while the assignment is in flight.
pub(crate) async fn ensure_assignable(
    conn: &mut PgConnection,
    team_id: Uuid,
    user_id: Uuid,
) -> Result<(), KanbanError> {
    match TeamMember::find_for_share(conn, team_id, user_id).await? {
        Some(_) => Ok(()),
        None => Err(KanbanError::validation(format!(
            "assignee {} is not a member of this team",
            user_id
        ))),
    }
}

/// Locks columns in id order and returns them in the order requested
pub(crate) async fn lock_columns(
    conn: &mut PgConnection,
    ids: &[Uuid],
) -> Result<Vec<Column>, KanbanError> {
    let mut sorted = ids.to_vec();
    sorted.sort();
    sorted.dedup();

    let mut locked = Vec::with_capacity(sorted.len());
    for id in sorted {
        let column = Column::lock(&mut *conn, id)
            .await?
            .ok_or(KanbanError::NotFound("Column"))?;
        locked.push(column);
    }

    ids.iter()
        .map(|id| {
            locked
                .iter()
                .find(|c| c.id == *id)
                .cloned()
                .ok_or(KanbanError::NotFound("Column"))
        })
        .collect()
}

/// Locks a card after its column is locked and checks it has not moved
pub(crate) async fn lock_card_in(
    conn: &mut PgConnection,
    card_id: Uuid,
    column_id: Uuid,
) -> Result<Card, KanbanError> {
    let card = Card::lock(conn, card_id)
        .await?
        .ok_or(KanbanError::NotFound("Card"))?;

    if card.column_id != column_id {
        return Err(KanbanError::conflict(
            "card was moved by another request; retry",
        ));
    }

    Ok(card)
}

/// Creates a card in a column
///
/// The card is appended unless `order` is given, in which case it is clamped
/// to `0..=count` and later cards shift down.
///
/// # Errors
///
/// - `NotFound` if the column does not exist
/// - `Validation` if the title is blank or the assignee is not a team member
pub async fn create_card(pool: &PgPool, input: NewCard) -> Result<Card, KanbanError> {
    let title = validate_title(&input.title)?;

    let mut tx = pool.begin().await?;

    let column = Column::lock(&mut *tx, input.column_id)
        .await?
        .ok_or(KanbanError::NotFound("Column"))?;

    if let Some(assignee_id) = input.assignee_id {
        let board = Board::find_by_id(&mut *tx, column.board_id)
            .await?
            .ok_or(KanbanError::NotFound("Board"))?;
        ensure_assignable(&mut tx, board.team_id, assignee_id).await?;
    }

    let count = Card::count_in_column(&mut *tx, column.id).await?;
    let slot = plan_insert(count, input.order);
    if let Some(shift) = slot.shift {
        Card::shift_positions(&mut *tx, column.id, shift, None).await?;
    }

    let card = Card::insert(
        &mut *tx,
        InsertCard {
            column_id: column.id,
            title,
            description: input.description,
            priority: input.priority,
            due_date: input.due_date,
            position: slot.position,
            assignee_id: input.assignee_id,
        },
    )
    .await?;

    tx.commit().await?;

    info!(
        card_id = %card.id,
        column_id = %card.column_id,
        position = card.position,
        "Card created"
    );

    Ok(card)
}

/// Updates a card's content
///
/// Column and position are changed only through [`super::history::move_card`].
pub async fn update_card(
    pool: &PgPool,
    card_id: Uuid,
    mut changes: UpdateCard,
) -> Result<Card, KanbanError> {
    if let Some(title) = changes.title.take() {
        changes.title = Some(validate_title(&title)?);
    }

    let mut tx = pool.begin().await?;

    if let Some(Some(assignee_id)) = changes.assignee_id {
        let board = Board::find_by_card(&mut *tx, card_id)
            .await?
            .ok_or(KanbanError::NotFound("Card"))?;
        ensure_assignable(&mut tx, board.team_id, assignee_id).await?;
    }

    let card = Card::update(&mut *tx, card_id, changes)
        .await?
        .ok_or(KanbanError::NotFound("Card"))?;

    tx.commit().await?;

    info!(card_id = %card.id, "Card updated");

    Ok(card)
}

/// Deletes a card and closes the gap in its column
///
/// History records go with the card.
pub async fn delete_card(pool: &PgPool, card_id: Uuid) -> Result<(), KanbanError> {
    let mut tx = pool.begin().await?;

    let current = Card::find_by_id(&mut *tx, card_id)
        .await?
        .ok_or(KanbanError::NotFound("Card"))?;
    lock_columns(&mut tx, &[current.column_id]).await?;
    let card = lock_card_in(&mut tx, card_id, current.column_id).await?;

    Card::delete(&mut *tx, card.id).await?;
    Card::shift_positions(&mut *tx, card.column_id, plan_remove(card.position), None).await?;

    tx.commit().await?;

    info!(card_id = %card_id, column_id = %card.column_id, "Card deleted");

    Ok(())
}

/// Loads a card with its assignee and full history, newest first
///
/// Read from one snapshot, like [`super::board_view::load_board`].
pub async fn get_card(pool: &PgPool, card_id: Uuid) -> Result<CardDetail, KanbanError> {
    let mut tx = begin_snapshot(pool).await?;

    let card = Card::find_by_id(&mut *tx, card_id)
        .await?
        .ok_or(KanbanError::NotFound("Card"))?;

    let assignee = match card.assignee_id {
        Some(id) => User::find_summaries(&mut *tx, &[id]).await?.into_iter().next(),
        None => None,
    };

    let history = CardHistory::list_for_card(&mut *tx, card.id).await?;

    tx.commit().await?;

    Ok(CardDetail {
        card,
        assignee,
        history,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_title() {
        assert_eq!(validate_title("  Fix login ").unwrap(), "Fix login");
        assert!(matches!(validate_title(""), Err(KanbanError::Validation(_))));
    }
}
