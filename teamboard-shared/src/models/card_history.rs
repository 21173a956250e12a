/// Card movement history
///
/// One immutable record per cross-column move, carrying the column names as
/// they were at the time of the move. Records are only removed by cascade
/// when their card is deleted.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE card_history (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     card_id UUID NOT NULL REFERENCES cards(id) ON DELETE CASCADE,
///     from_column VARCHAR(255) NOT NULL,
///     to_column VARCHAR(255) NOT NULL,
///     moved_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Number of history entries embedded per card in board views
pub const RECENT_HISTORY_LIMIT: i64 = 5;

/// A card's transition from one column to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CardHistory {
    pub id: Uuid,
    pub card_id: Uuid,

    #[serde(rename = "from")]
    pub from_column: String,

    #[serde(rename = "to")]
    pub to_column: String,

    pub moved_at: DateTime<Utc>,
}

impl CardHistory {
    /// Appends a history record stamped with the current time
    pub async fn append<'e>(
        executor: impl PgExecutor<'e>,
        card_id: Uuid,
        from_column: &str,
        to_column: &str,
    ) -> Result<Self, sqlx::Error> {
        let entry = sqlx::query_as::<_, CardHistory>(
            r#"
            INSERT INTO card_history (card_id, from_column, to_column)
            VALUES ($1, $2, $3)
            RETURNING id, card_id, from_column, to_column, moved_at
            "#,
        )
        .bind(card_id)
        .bind(from_column)
        .bind(to_column)
        .fetch_one(executor)
        .await?;

        Ok(entry)
    }

    /// Full history of one card, newest first
    pub async fn list_for_card<'e>(
        executor: impl PgExecutor<'e>,
        card_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let entries = sqlx::query_as::<_, CardHistory>(
            r#"
            SELECT id, card_id, from_column, to_column, moved_at
            FROM card_history
            WHERE card_id = $1
            ORDER BY moved_at DESC, id DESC
            "#,
        )
        .bind(card_id)
        .fetch_all(executor)
        .await?;

        Ok(entries)
    }

    /// The most recent `limit` entries of each card, newest first per card
    pub async fn list_recent_for_cards<'e>(
        executor: impl PgExecutor<'e>,
        card_ids: &[Uuid],
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        if card_ids.is_empty() {
            return Ok(Vec::new());
        }

        let entries = sqlx::query_as::<_, CardHistory>(
            r#"
            SELECT id, card_id, from_column, to_column, moved_at
            FROM (
                SELECT id, card_id, from_column, to_column, moved_at,
                       ROW_NUMBER() OVER (PARTITION BY card_id ORDER BY moved_at DESC, id DESC) AS rn
                FROM card_history
                WHERE card_id = ANY($1)
            ) ranked
            WHERE rn <= $2
            ORDER BY card_id, moved_at DESC, id DESC
            "#,
        )
        .bind(card_ids)
        .bind(limit)
        .fetch_all(executor)
        .await?;

        Ok(entries)
    }

    /// All history of the cards currently on a board, oldest first
    pub async fn list_for_board<'e>(
        executor: impl PgExecutor<'e>,
        board_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let entries = sqlx::query_as::<_, CardHistory>(
            r#"
            SELECT h.id, h.card_id, h.from_column, h.to_column, h.moved_at
            FROM card_history h
            INNER JOIN cards c ON c.id = h.card_id
            INNER JOIN columns col ON col.id = c.column_id
            WHERE col.board_id = $1
            ORDER BY h.moved_at ASC, h.id ASC
            "#,
        )
        .bind(board_id)
        .fetch_all(executor)
        .await?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_serializes_from_and_to() {
        let entry = CardHistory {
            id: Uuid::new_v4(),
            card_id: Uuid::new_v4(),
            from_column: "To Do".to_string(),
            to_column: "Done".to_string(),
            moved_at: Utc::now(),
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["from"], "To Do");
        assert_eq!(json["to"], "Done");
        assert!(json.get("from_column").is_none());
    }
}
