/// Card model and database operations
///
/// Cards sit in exactly one column at a dense, zero-based position. Position
/// bookkeeping (shifting siblings on insert, move, and delete) is driven by
/// [`crate::kanban`]; this module only exposes the row-level queries.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE card_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE cards (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     column_id UUID NOT NULL REFERENCES columns(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     priority card_priority NOT NULL DEFAULT 'medium',
///     due_date DATE,
///     position INTEGER NOT NULL CHECK (position >= 0),
///     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT cards_column_position_key UNIQUE (column_id, position)
///         DEFERRABLE INITIALLY DEFERRED
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::kanban::ordering::Shift;

/// Card priority
///
/// Portuguese labels (`baixa`, `média`, `alta`) are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "card_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[serde(alias = "baixa")]
    Low,

    #[default]
    #[serde(alias = "média", alias = "media")]
    Medium,

    #[serde(alias = "alta")]
    High,
}

const CARD_COLUMNS: &str = "id, column_id, title, description, priority, due_date, position, \
                            assignee_id, created_at, updated_at";

/// Kanban card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Card {
    pub id: Uuid,
    pub column_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,

    /// Zero-based position within the column
    #[serde(rename = "order")]
    pub position: i32,

    pub assignee_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Card assigned to a user, with where it lives
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AssignedCard {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub card: Card,

    pub column_name: String,
    pub board_id: Uuid,
    pub board_name: String,
    pub team_id: Uuid,
}

/// Row values for inserting a card at a known position
#[derive(Debug, Clone)]
pub struct InsertCard {
    pub column_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub position: i32,
    pub assignee_id: Option<Uuid>,
}

/// Partial update of a card's content
///
/// Outer `None` leaves a field alone; `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateCard {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<NaiveDate>>,
    pub assignee_id: Option<Option<Uuid>>,
}

impl UpdateCard {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.assignee_id.is_none()
    }
}

impl Card {
    pub async fn insert<'e>(
        executor: impl PgExecutor<'e>,
        data: InsertCard,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO cards (column_id, title, description, priority, due_date, position, assignee_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {CARD_COLUMNS}
            "#
        );

        let card = sqlx::query_as::<_, Card>(&query)
            .bind(data.column_id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.priority)
            .bind(data.due_date)
            .bind(data.position)
            .bind(data.assignee_id)
            .fetch_one(executor)
            .await?;

        Ok(card)
    }

    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {CARD_COLUMNS} FROM cards WHERE id = $1");

        let card = sqlx::query_as::<_, Card>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(card)
    }

    /// Loads a card and locks its row for the rest of the transaction
    pub async fn lock<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {CARD_COLUMNS} FROM cards WHERE id = $1 FOR UPDATE");

        let card = sqlx::query_as::<_, Card>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(card)
    }

    /// Counts the cards in a column
    pub async fn count_in_column<'e>(
        executor: impl PgExecutor<'e>,
        column_id: Uuid,
    ) -> Result<i32, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cards WHERE column_id = $1")
            .bind(column_id)
            .fetch_one(executor)
            .await?;

        Ok(i32::try_from(count).unwrap_or(i32::MAX))
    }

    /// Lists all cards on a board, by column position then card position
    pub async fn list_by_board<'e>(
        executor: impl PgExecutor<'e>,
        board_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let cards = sqlx::query_as::<_, Card>(
            r#"
            SELECT c.id, c.column_id, c.title, c.description, c.priority, c.due_date,
                   c.position, c.assignee_id, c.created_at, c.updated_at
            FROM cards c
            INNER JOIN columns col ON col.id = c.column_id
            WHERE col.board_id = $1
            ORDER BY col.position ASC, c.position ASC
            "#,
        )
        .bind(board_id)
        .fetch_all(executor)
        .await?;

        Ok(cards)
    }

    /// Lists cards assigned to a user across all teams
    ///
    /// Ordered by due date, cards without one last.
    pub async fn list_for_assignee<'e>(
        executor: impl PgExecutor<'e>,
        user_id: Uuid,
    ) -> Result<Vec<AssignedCard>, sqlx::Error> {
        let cards = sqlx::query_as::<_, AssignedCard>(
            r#"
            SELECT c.id, c.column_id, c.title, c.description, c.priority, c.due_date,
                   c.position, c.assignee_id, c.created_at, c.updated_at,
                   col.name AS column_name, b.id AS board_id, b.name AS board_name,
                   b.team_id
            FROM cards c
            INNER JOIN columns col ON col.id = c.column_id
            INNER JOIN boards b ON b.id = col.board_id
            INNER JOIN team_members m ON m.team_id = b.team_id AND m.user_id = c.assignee_id
            WHERE c.assignee_id = $1
            ORDER BY c.due_date ASC NULLS LAST, c.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await?;

        Ok(cards)
    }

    /// Applies a position shift to a column's cards
    ///
    /// `except` is left untouched, so a card being moved within its own
    /// column can be excluded from the shift. Does not bump `updated_at`.
    pub async fn shift_positions<'e>(
        executor: impl PgExecutor<'e>,
        column_id: Uuid,
        shift: Shift,
        except: Option<Uuid>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE cards
            SET position = position + $4
            WHERE column_id = $1
              AND position >= $2
              AND ($3::INTEGER IS NULL OR position <= $3)
              AND ($5::UUID IS NULL OR id <> $5)
            "#,
        )
        .bind(column_id)
        .bind(shift.start)
        .bind(shift.end)
        .bind(shift.delta)
        .bind(except)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Places a card in a column at a position and bumps `updated_at`
    pub async fn relocate<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
        column_id: Uuid,
        position: i32,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE cards
            SET column_id = $2, position = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {CARD_COLUMNS}
            "#
        );

        let card = sqlx::query_as::<_, Card>(&query)
            .bind(id)
            .bind(column_id)
            .bind(position)
            .fetch_optional(executor)
            .await?;

        Ok(card)
    }

    /// Updates a card's content fields and bumps `updated_at`
    pub async fn update<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
        data: UpdateCard,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE cards SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }
        if data.assignee_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assignee_id = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {CARD_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Card>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }
        if let Some(assignee_id) = data.assignee_id {
            q = q.bind(assignee_id);
        }

        let card = q.fetch_optional(executor).await?;

        Ok(card)
    }

    /// Clears a user as assignee on every card of a team's boards
    ///
    /// Leaves `updated_at` alone so completion dates are unaffected. Returns
    /// the number of cards changed.
    pub async fn unassign_in_team<'e>(
        executor: impl PgExecutor<'e>,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE cards
            SET assignee_id = NULL
            WHERE assignee_id = $2
              AND column_id IN (
                  SELECT c.id
                  FROM columns c
                  INNER JOIN boards b ON b.id = c.board_id
                  WHERE b.team_id = $1
              )
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cards WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_accepts_portuguese_aliases() {
        let cases = [
            ("\"baixa\"", Priority::Low),
            ("\"média\"", Priority::Medium),
            ("\"media\"", Priority::Medium),
            ("\"alta\"", Priority::High),
            ("\"high\"", Priority::High),
        ];

        for (input, expected) in cases {
            let priority: Priority = serde_json::from_str(input).unwrap();
            assert_eq!(priority, expected, "input {}", input);
        }

        assert!(serde_json::from_str::<Priority>("\"urgent\"").is_err());
    }

    #[test]
    fn test_priority_serializes_in_english() {
        assert_eq!(serde_json::to_string(&Priority::Medium).unwrap(), "\"medium\"");
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_update_card_is_empty() {
        assert!(UpdateCard::default().is_empty());

        let clear_due = UpdateCard {
            due_date: Some(None),
            ..Default::default()
        };
        assert!(!clear_due.is_empty());
    }

    #[test]
    fn test_assigned_card_flattens() {
        let card = Card {
            id: Uuid::new_v4(),
            column_id: Uuid::new_v4(),
            title: "Write docs".to_string(),
            description: None,
            priority: Priority::High,
            due_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            position: 0,
            assignee_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let assigned = AssignedCard {
            card,
            column_name: "To Do".to_string(),
            board_id: Uuid::new_v4(),
            board_name: "Main Board".to_string(),
            team_id: Uuid::new_v4(),
        };

        let json = serde_json::to_value(&assigned).unwrap();
        assert_eq!(json["title"], "Write docs");
        assert_eq!(json["due_date"], "2024-03-01");
        assert_eq!(json["order"], 0);
        assert_eq!(json["column_name"], "To Do");
    }
}
