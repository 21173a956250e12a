/// Read model of a whole board
///
/// Columns in order, each with its cards in order, each card with its
/// assignee and most recent moves.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::error::KanbanError;
use crate::db::pool::begin_snapshot;
use crate::models::board::Board;
use crate::models::card::Card;
use crate::models::card_history::{CardHistory, RECENT_HISTORY_LIMIT};
use crate::models::column::Column;
use crate::models::user::{User, UserSummary};

#[derive(Debug, Clone, Serialize)]
pub struct BoardCard {
    #[serde(flatten)]
    pub card: Card,
    pub assignee: Option<UserSummary>,

    /// Most recent moves, newest first
    pub history: Vec<CardHistory>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardColumn {
    #[serde(flatten)]
    pub column: Column,
    pub cards: Vec<BoardCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardDetail {
    #[serde(flatten)]
    pub board: Board,
    pub columns: Vec<BoardColumn>,
}

/// Groups loaded rows into the nested board shape
///
/// `columns` and `cards` must already be in position order.
pub fn assemble(
    board: Board,
    columns: Vec<Column>,
    cards: Vec<Card>,
    history: Vec<CardHistory>,
    users: &[UserSummary],
) -> BoardDetail {
    let mut history_by_card: HashMap<Uuid, Vec<CardHistory>> = HashMap::new();
    for entry in history {
        history_by_card.entry(entry.card_id).or_default().push(entry);
    }

    let mut cards_by_column: HashMap<Uuid, Vec<BoardCard>> = HashMap::new();
    for card in cards {
        let assignee = card
            .assignee_id
            .and_then(|id| users.iter().find(|u| u.id == id).cloned());
        let history = history_by_card.remove(&card.id).unwrap_or_default();
        cards_by_column
            .entry(card.column_id)
            .or_default()
            .push(BoardCard {
                card,
                assignee,
                history,
            });
    }

    let columns = columns
        .into_iter()
        .map(|column| BoardColumn {
            cards: cards_by_column.remove(&column.id).unwrap_or_default(),
            column,
        })
        .collect();

    BoardDetail { board, columns }
}

/// Loads a board with its columns, cards, assignees, and recent history
///
/// Every row comes from the same snapshot, so a card's column always agrees
/// with its newest history entry.
pub async fn load_board(pool: &PgPool, board_id: Uuid) -> Result<BoardDetail, KanbanError> {
    let mut tx = begin_snapshot(pool).await?;

    let board = Board::find_by_id(&mut *tx, board_id)
        .await?
        .ok_or(KanbanError::NotFound("Board"))?;

    let columns = Column::list_by_board(&mut *tx, board_id).await?;
    let cards = Card::list_by_board(&mut *tx, board_id).await?;

    let card_ids: Vec<Uuid> = cards.iter().map(|c| c.id).collect();
    let history =
        CardHistory::list_recent_for_cards(&mut *tx, &card_ids, RECENT_HISTORY_LIMIT).await?;

    let mut assignee_ids: Vec<Uuid> = cards.iter().filter_map(|c| c.assignee_id).collect();
    assignee_ids.sort();
    assignee_ids.dedup();
    let users = User::find_summaries(&mut *tx, &assignee_ids).await?;

    tx.commit().await?;

    Ok(assemble(board, columns, cards, history, &users))
}
