/// Board model and database operations
///
/// Boards belong to a team. The team's oldest board is its default board.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE boards (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     team_id UUID NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Kanban board
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Board {
    pub id: Uuid,
    pub team_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Board {
    /// Creates a board with no columns
    ///
    /// Use [`crate::kanban::provisioning::create_board`] to get the default
    /// column set as well.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        team_id: Uuid,
        name: &str,
    ) -> Result<Self, sqlx::Error> {
        let board = sqlx::query_as::<_, Board>(
            r#"
            INSERT INTO boards (team_id, name)
            VALUES ($1, $2)
            RETURNING id, team_id, name, created_at
            "#,
        )
        .bind(team_id)
        .bind(name)
        .fetch_one(executor)
        .await?;

        Ok(board)
    }

    /// Finds a board by ID
    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let board = sqlx::query_as::<_, Board>(
            "SELECT id, team_id, name, created_at FROM boards WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(board)
    }

    /// Loads a board and locks its row for the rest of the transaction
    ///
    /// Column inserts, deletes, and reorders lock the board first so that
    /// column position arithmetic is serialized per board.
    pub async fn lock<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let board = sqlx::query_as::<_, Board>(
            "SELECT id, team_id, name, created_at FROM boards WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(board)
    }

    /// Finds the board a column belongs to
    pub async fn find_by_column<'e>(
        executor: impl PgExecutor<'e>,
        column_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let board = sqlx::query_as::<_, Board>(
            r#"
            SELECT b.id, b.team_id, b.name, b.created_at
            FROM boards b
            INNER JOIN columns col ON col.board_id = b.id
            WHERE col.id = $1
            "#,
        )
        .bind(column_id)
        .fetch_optional(executor)
        .await?;

        Ok(board)
    }

    /// Finds the board a card belongs to
    pub async fn find_by_card<'e>(
        executor: impl PgExecutor<'e>,
        card_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let board = sqlx::query_as::<_, Board>(
            r#"
            SELECT b.id, b.team_id, b.name, b.created_at
            FROM boards b
            INNER JOIN columns col ON col.board_id = b.id
            INNER JOIN cards c ON c.column_id = col.id
            WHERE c.id = $1
            "#,
        )
        .bind(card_id)
        .fetch_optional(executor)
        .await?;

        Ok(board)
    }

    /// Finds the team's default (oldest) board
    pub async fn find_default<'e>(
        executor: impl PgExecutor<'e>,
        team_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let board = sqlx::query_as::<_, Board>(
            r#"
            SELECT id, team_id, name, created_at
            FROM boards
            WHERE team_id = $1
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(team_id)
        .fetch_optional(executor)
        .await?;

        Ok(board)
    }

    /// Lists a team's boards, oldest first
    pub async fn list_by_team<'e>(
        executor: impl PgExecutor<'e>,
        team_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let boards = sqlx::query_as::<_, Board>(
            r#"
            SELECT id, team_id, name, created_at
            FROM boards
            WHERE team_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(team_id)
        .fetch_all(executor)
        .await?;

        Ok(boards)
    }
}
