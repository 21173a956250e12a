/// Team model and database operations
///
/// A team owns boards and has members. Every user gets a personal team at
/// registration; more can be created explicitly.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE teams (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use teamboard_shared::models::team::Team;
/// use teamboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let team = Team::create(&pool, "Platform").await?;
/// assert_eq!(team.name, "Platform");
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Team
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    /// Unique team ID
    pub id: Uuid,

    /// Team name
    pub name: String,

    /// When the team was created
    pub created_at: DateTime<Utc>,

    /// When the team was last updated
    pub updated_at: DateTime<Utc>,
}

/// Name given to the personal team created at registration
pub fn personal_team_name(user_name: &str) -> String {
    format!("{}'s Team", user_name)
}

impl Team {
    /// Creates a new team
    pub async fn create<'e>(executor: impl PgExecutor<'e>, name: &str) -> Result<Self, sqlx::Error> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            INSERT INTO teams (name)
            VALUES ($1)
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(name)
        .fetch_one(executor)
        .await?;

        Ok(team)
    }

    /// Finds a team by ID
    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            SELECT id, name, created_at, updated_at
            FROM teams
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(team)
    }

    /// Locks the team row for the rest of the transaction
    ///
    /// Used to serialize default-board provisioning per team. Returns `None`
    /// if the team does not exist.
    pub async fn lock<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            SELECT id, name, created_at, updated_at
            FROM teams
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(team)
    }

    /// Lists the teams a user belongs to, oldest first
    pub async fn list_for_user<'e>(
        executor: impl PgExecutor<'e>,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let teams = sqlx::query_as::<_, Team>(
            r#"
            SELECT t.id, t.name, t.created_at, t.updated_at
            FROM teams t
            INNER JOIN team_members m ON m.team_id = t.id
            WHERE m.user_id = $1
            ORDER BY t.created_at ASC, t.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await?;

        Ok(teams)
    }

    /// Deletes a team
    ///
    /// Cascades to memberships, boards, columns, cards, and card history.
    /// Returns true if the team existed.
    pub async fn delete<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
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
    fn test_personal_team_name() {
        assert_eq!(personal_team_name("Ana"), "Ana's Team");
    }

    #[test]
    fn test_team_serialization() {
        let team = Team {
            id: Uuid::new_v4(),
            name: "Platform".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&team).unwrap();
        assert_eq!(json["name"], "Platform");
        assert!(json.get("created_at").is_some());
    }
}
