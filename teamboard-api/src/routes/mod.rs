/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, token refresh, current user
/// - `teams`: Teams and membership
/// - `boards`: Boards, board detail, and metrics
/// - `columns`: Column creation, update, deletion, and reordering
/// - `cards`: Cards, moves, and the caller's assigned cards
///
/// Every board, column, and card belongs to one team. Handlers resolve that
/// team with the helpers below before touching the resource, answering 404
/// for unknown ids and 403 for callers outside the team.

pub mod auth;
pub mod boards;
pub mod cards;
pub mod columns;
pub mod health;
pub mod teams;

use crate::error::{ApiError, ApiResult};
use sqlx::PgPool;
use teamboard_shared::{
    auth::authorization::require_membership,
    models::{board::Board, membership::TeamRole, team::Team},
};
use uuid::Uuid;

/// Loads a team and returns the caller's role in it
pub(crate) async fn authorize_team(
    db: &PgPool,
    team_id: Uuid,
    user_id: Uuid,
) -> ApiResult<(Team, TeamRole)> {
    let team = Team::find_by_id(db, team_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))?;
    let role = require_membership(db, team.id, user_id).await?;
    Ok((team, role))
}

/// Loads a board and checks the caller belongs to its team
pub(crate) async fn authorize_board(
    db: &PgPool,
    board_id: Uuid,
    user_id: Uuid,
) -> ApiResult<Board> {
    let board = Board::find_by_id(db, board_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Board not found".to_string()))?;
    require_membership(db, board.team_id, user_id).await?;
    Ok(board)
}

/// Loads the board of a column and checks the caller belongs to its team
pub(crate) async fn authorize_column(
    db: &PgPool,
    column_id: Uuid,
    user_id: Uuid,
) -> ApiResult<Board> {
    let board = Board::find_by_column(db, column_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Column not found".to_string()))?;
    require_membership(db, board.team_id, user_id).await?;
    Ok(board)
}

/// Loads the board of a card and checks the caller belongs to its team
pub(crate) async fn authorize_card(
    db: &PgPool,
    card_id: Uuid,
    user_id: Uuid,
) -> ApiResult<Board> {
    let board = Board::find_by_card(db, card_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Card not found".to_string()))?;
    require_membership(db, board.team_id, user_id).await?;
    Ok(board)
}
