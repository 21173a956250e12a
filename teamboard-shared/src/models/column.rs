/// Column model and database operations
///
/// Columns are the ordered stages of a board. Positions within a board are
/// dense and zero-based; the unique constraint on `(board_id, position)` is
/// deferred to commit so positions can be shifted in bulk inside a
/// transaction.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE column_role AS ENUM ('backlog', 'in_progress', 'done', 'custom');
///
/// CREATE TABLE columns (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     board_id UUID NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     position INTEGER NOT NULL CHECK (position >= 0),
///     color VARCHAR(32),
///     role column_role NOT NULL DEFAULT 'custom',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT columns_board_position_key UNIQUE (board_id, position)
///         DEFERRABLE INITIALLY DEFERRED
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::kanban::ordering::Shift;

/// What a column means for metrics
///
/// Metrics classify cards by the role of their column, never by its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "column_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    /// Work not started yet
    Backlog,

    /// Work being done
    InProgress,

    /// Terminal column; cards here count as completed
    Done,

    /// Any other stage
    #[default]
    Custom,
}

impl ColumnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnRole::Backlog => "backlog",
            ColumnRole::InProgress => "in_progress",
            ColumnRole::Done => "done",
            ColumnRole::Custom => "custom",
        }
    }
}

/// Board column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Column {
    pub id: Uuid,
    pub board_id: Uuid,
    pub name: String,

    /// Zero-based position within the board
    #[serde(rename = "order")]
    pub position: i32,

    pub color: Option<String>,
    pub role: ColumnRole,
    pub created_at: DateTime<Utc>,
}

/// Row values for inserting a column at a known position
#[derive(Debug, Clone)]
pub struct InsertColumn<'a> {
    pub board_id: Uuid,
    pub name: &'a str,
    pub position: i32,
    pub color: Option<&'a str>,
    pub role: ColumnRole,
}

/// Partial update of a column
///
/// `color: Some(None)` clears the color.
#[derive(Debug, Clone, Default)]
pub struct UpdateColumn {
    pub name: Option<String>,
    pub color: Option<Option<String>>,
    pub role: Option<ColumnRole>,
}

impl Column {
    pub async fn insert<'e>(
        executor: impl PgExecutor<'e>,
        data: InsertColumn<'_>,
    ) -> Result<Self, sqlx::Error> {
        let column = sqlx::query_as::<_, Column>(
            r#"
            INSERT INTO columns (board_id, name, position, color, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, board_id, name, position, color, role, created_at
            "#,
        )
        .bind(data.board_id)
        .bind(data.name)
        .bind(data.position)
        .bind(data.color)
        .bind(data.role)
        .fetch_one(executor)
        .await?;

        Ok(column)
    }

    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let column = sqlx::query_as::<_, Column>(
            r#"
            SELECT id, board_id, name, position, color, role, created_at
            FROM columns
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(column)
    }

    /// Lists a board's columns in position order
    pub async fn list_by_board<'e>(
        executor: impl PgExecutor<'e>,
        board_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let columns = sqlx::query_as::<_, Column>(
            r#"
            SELECT id, board_id, name, position, color, role, created_at
            FROM columns
            WHERE board_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(board_id)
        .fetch_all(executor)
        .await?;

        Ok(columns)
    }

    /// Loads a column and locks its row for the rest of the transaction
    ///
    /// Card inserts, moves, and deletes lock the columns they touch so that
    /// position arithmetic within a column is serialized.
    pub async fn lock<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let column = sqlx::query_as::<_, Column>(
            r#"
            SELECT id, board_id, name, position, color, role, created_at
            FROM columns
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(column)
    }

    /// Applies a position shift to the board's columns
    pub async fn shift_positions<'e>(
        executor: impl PgExecutor<'e>,
        board_id: Uuid,
        shift: Shift,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE columns
            SET position = position + $4
            WHERE board_id = $1
              AND position >= $2
              AND ($3::INTEGER IS NULL OR position <= $3)
            "#,
        )
        .bind(board_id)
        .bind(shift.start)
        .bind(shift.end)
        .bind(shift.delta)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn set_position<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
        position: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE columns SET position = $2 WHERE id = $1")
            .bind(id)
            .bind(position)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Updates name, color, and role
    ///
    /// Only provided fields are changed.
    pub async fn update<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
        data: UpdateColumn,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut sets = Vec::new();
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            sets.push(format!("name = ${}", bind_count));
        }
        if data.color.is_some() {
            bind_count += 1;
            sets.push(format!("color = ${}", bind_count));
        }
        if data.role.is_some() {
            bind_count += 1;
            sets.push(format!("role = ${}", bind_count));
        }

        if sets.is_empty() {
            return Self::find_by_id(executor, id).await;
        }

        let query = format!(
            "UPDATE columns SET {} WHERE id = $1 \
             RETURNING id, board_id, name, position, color, role, created_at",
            sets.join(", ")
        );

        let mut q = sqlx::query_as::<_, Column>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(color) = data.color {
            q = q.bind(color);
        }
        if let Some(role) = data.role {
            q = q.bind(role);
        }

        let column = q.fetch_optional(executor).await?;

        Ok(column)
    }

    pub async fn delete<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM columns WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
