/// Board endpoints
///
/// # Endpoints
///
/// - `GET /v1/teams/:team_id/boards` - List a team's boards
/// - `POST /v1/teams/:team_id/boards` - Create a board with the default columns
/// - `GET /v1/teams/:team_id/board` - The team's default board, in full
/// - `GET /v1/teams/:team_id/metrics` - Metrics of the default board
/// - `GET /v1/boards/:board_id` - Board with columns, cards, and recent history
/// - `GET /v1/boards/:board_id/metrics` - Board metrics

use super::{authorize_board, authorize_team};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ValidatedJson,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use teamboard_shared::{
    auth::middleware::AuthContext,
    kanban::{self, provisioning, BoardDetail, MetricsSnapshot},
    models::{board::Board, column::Column},
};
use uuid::Uuid;
use validator::Validate;

/// Create board request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBoardRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,
}

/// Newly created board with its columns
#[derive(Debug, Serialize)]
pub struct CreatedBoard {
    #[serde(flatten)]
    pub board: Board,
    pub columns: Vec<Column>,
}

async fn default_board_id(state: &AppState, team_id: Uuid, user_id: Uuid) -> ApiResult<Uuid> {
    authorize_team(&state.db, team_id, user_id).await?;

    let board = Board::find_default(&state.db, team_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team has no board".to_string()))?;

    Ok(board.id)
}

/// List a team's boards, oldest first
pub async fn list_boards(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(team_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Board>>> {
    authorize_team(&state.db, team_id, auth.user_id).await?;

    let boards = Board::list_by_team(&state.db, team_id).await?;
    Ok(Json(boards))
}

/// Create a board with "To Do", "In Progress", and "Done" columns
pub async fn create_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(team_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<CreateBoardRequest>,
) -> ApiResult<(StatusCode, Json<CreatedBoard>)> {
    authorize_team(&state.db, team_id, auth.user_id).await?;

    let (board, columns) = provisioning::add_board(&state.db, team_id, &req.name).await?;

    Ok((StatusCode::CREATED, Json(CreatedBoard { board, columns })))
}

/// The team's default board in full
pub async fn get_default_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(team_id): Path<Uuid>,
) -> ApiResult<Json<BoardDetail>> {
    let board_id = default_board_id(&state, team_id, auth.user_id).await?;
    Ok(Json(kanban::load_board(&state.db, board_id).await?))
}

/// Metrics of the team's default board
pub async fn get_default_metrics(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(team_id): Path<Uuid>,
) -> ApiResult<Json<MetricsSnapshot>> {
    let board_id = default_board_id(&state, team_id, auth.user_id).await?;
    Ok(Json(kanban::compute_metrics(&state.db, board_id).await?))
}

/// Board with ordered columns, ordered cards, assignees, and the five most
/// recent moves of each card
pub async fn get_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<Uuid>,
) -> ApiResult<Json<BoardDetail>> {
    authorize_board(&state.db, board_id, auth.user_id).await?;
    Ok(Json(kanban::load_board(&state.db, board_id).await?))
}

/// Board metrics
pub async fn get_metrics(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<Uuid>,
) -> ApiResult<Json<MetricsSnapshot>> {
    authorize_board(&state.db, board_id, auth.user_id).await?;
    Ok(Json(kanban::compute_metrics(&state.db, board_id).await?))
}
