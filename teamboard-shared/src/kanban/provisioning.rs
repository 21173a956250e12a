/// Default board provisioning and workspace setup
///
/// Every team starts with a board named "Main Board" holding three columns:
/// "To Do" (backlog), "In Progress" (in progress), and "Done" (done).
/// Boards are only created by explicit writes here, never as a side effect
/// of reading.

use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use super::error::KanbanError;
use crate::models::board::Board;
use crate::models::column::{Column, ColumnRole, InsertColumn};
use crate::models::membership::{CreateTeamMember, TeamMember, TeamRole};
use crate::models::team::{personal_team_name, Team};
use crate::models::user::{CreateUser, User};

/// Name of the board every team gets
pub const DEFAULT_BOARD_NAME: &str = "Main Board";

/// Columns of a new board, in order
pub const DEFAULT_COLUMNS: [(&str, ColumnRole); 3] = [
    ("To Do", ColumnRole::Backlog),
    ("In Progress", ColumnRole::InProgress),
    ("Done", ColumnRole::Done),
];

/// Creates a board with the default columns
pub async fn create_board(
    conn: &mut PgConnection,
    team_id: Uuid,
    name: &str,
) -> Result<(Board, Vec<Column>), KanbanError> {
    let board = Board::create(&mut *conn, team_id, name).await?;

    let mut columns = Vec::with_capacity(DEFAULT_COLUMNS.len());
    for (position, (column_name, role)) in DEFAULT_COLUMNS.iter().enumerate() {
        let column = Column::insert(
            &mut *conn,
            InsertColumn {
                board_id: board.id,
                name: column_name,
                position: position as i32,
                color: None,
                role: *role,
            },
        )
        .await?;
        columns.push(column);
    }

    info!(board_id = %board.id, team_id = %team_id, "Board created");

    Ok((board, columns))
}

/// Adds a board with the default columns to an existing team
pub async fn add_board(
    pool: &PgPool,
    team_id: Uuid,
    name: &str,
) -> Result<(Board, Vec<Column>), KanbanError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(KanbanError::validation("board name must not be empty"));
    }

    let mut tx = pool.begin().await?;
    Team::lock(&mut *tx, team_id)
        .await?
        .ok_or(KanbanError::NotFound("Team"))?;
    let created = create_board(&mut tx, team_id, name).await?;
    tx.commit().await?;

    Ok(created)
}

/// Returns the team's default board, creating it if the team has none
///
/// Locks the team row first, so concurrent callers for the same team end
/// up with the same board.
///
/// # Errors
///
/// `NotFound` if the team does not exist.
pub async fn ensure_default_board(
    conn: &mut PgConnection,
    team_id: Uuid,
) -> Result<Board, KanbanError> {
    Team::lock(&mut *conn, team_id)
        .await?
        .ok_or(KanbanError::NotFound("Team"))?;

    if let Some(board) = Board::find_default(&mut *conn, team_id).await? {
        return Ok(board);
    }

    let (board, _) = create_board(conn, team_id, DEFAULT_BOARD_NAME).await?;
    Ok(board)
}

/// Creates a team owned by `owner_id`, with its default board
pub async fn create_team(pool: &PgPool, owner_id: Uuid, name: &str) -> Result<Team, KanbanError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(KanbanError::validation("team name must not be empty"));
    }

    let mut tx = pool.begin().await?;
    let team = create_owned_team(&mut tx, owner_id, name).await?;
    tx.commit().await?;

    Ok(team)
}

async fn create_owned_team(
    conn: &mut PgConnection,
    owner_id: Uuid,
    name: &str,
) -> Result<Team, KanbanError> {
    let team = Team::create(&mut *conn, name).await?;

    TeamMember::create(
        &mut *conn,
        CreateTeamMember {
            team_id: team.id,
            user_id: owner_id,
            role: TeamRole::Owner,
        },
    )
    .await?;

    ensure_default_board(conn, team.id).await?;

    info!(team_id = %team.id, owner_id = %owner_id, "Team created");

    Ok(team)
}

/// Creates a user together with a personal team and its default board
///
/// # Errors
///
/// `Conflict` if the email is already registered.
pub async fn register_user(pool: &PgPool, data: CreateUser) -> Result<(User, Team), KanbanError> {
    let mut tx = pool.begin().await?;

    let user = User::create(&mut *tx, data).await.map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.constraint() == Some("users_email_key") => {
            KanbanError::conflict("email is already registered")
        }
        other => KanbanError::Database(other),
    })?;

    let team = create_owned_team(&mut tx, user.id, &personal_team_name(&user.name)).await?;

    tx.commit().await?;

    info!(user_id = %user.id, team_id = %team.id, "User registered");

    Ok((user, team))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_columns() {
        let names: Vec<&str> = DEFAULT_COLUMNS.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["To Do", "In Progress", "Done"]);
        assert_eq!(DEFAULT_COLUMNS[2].1, ColumnRole::Done);
        assert_eq!(DEFAULT_BOARD_NAME, "Main Board");
    }
}
