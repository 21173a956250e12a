/// Team membership model and database operations
///
/// Links users to teams with a role. A user may belong to many teams, and the
/// `(team_id, user_id)` pair is the primary key.
///
/// # Roles
///
/// - **Owner**: full control, including deleting the team and changing roles
/// - **Admin**: can add and remove members
/// - **Member**: can work on the team's boards
///
/// # Schema
///
/// ```sql
/// CREATE TYPE team_role AS ENUM ('owner', 'admin', 'member');
///
/// CREATE TABLE team_members (
///     team_id UUID NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role team_role NOT NULL DEFAULT 'member',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (team_id, user_id)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use teamboard_shared::models::membership::{TeamMember, TeamRole, CreateTeamMember};
/// use teamboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let team_id = Uuid::new_v4();
/// let user_id = Uuid::new_v4();
///
/// TeamMember::create(&pool, CreateTeamMember {
///     team_id,
///     user_id,
///     role: TeamRole::Admin,
/// }).await?;
///
/// let role = TeamMember::get_role(&pool, team_id, user_id).await?;
/// assert_eq!(role, Some(TeamRole::Admin));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Role of a user within a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "team_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    /// Full control over the team
    Owner,

    /// Can manage members
    Admin,

    /// Can work on boards
    Member,
}

impl TeamRole {
    /// Returns the role as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamRole::Owner => "owner",
            TeamRole::Admin => "admin",
            TeamRole::Member => "member",
        }
    }

    /// Checks if this role satisfies a required role
    ///
    /// Owner > Admin > Member.
    ///
    /// # Example
    ///
    /// ```
    /// use teamboard_shared::models::membership::TeamRole;
    ///
    /// assert!(TeamRole::Owner.has_permission(&TeamRole::Admin));
    /// assert!(!TeamRole::Member.has_permission(&TeamRole::Admin));
    /// ```
    pub fn has_permission(&self, required: &TeamRole) -> bool {
        self.permission_level() >= required.permission_level()
    }

    fn permission_level(&self) -> u8 {
        match self {
            TeamRole::Owner => 3,
            TeamRole::Admin => 2,
            TeamRole::Member => 1,
        }
    }
}

/// Team membership
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TeamMember {
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: TeamRole,
    pub created_at: DateTime<Utc>,
}

/// Membership joined with the member's public profile
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MemberProfile {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: TeamRole,
    pub joined_at: DateTime<Utc>,
}

/// Input for creating a membership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTeamMember {
    pub team_id: Uuid,
    pub user_id: Uuid,

    #[serde(default = "default_role")]
    pub role: TeamRole,
}

fn default_role() -> TeamRole {
    TeamRole::Member
}

impl TeamMember {
    /// Creates a membership
    ///
    /// # Errors
    ///
    /// Returns a unique violation on `team_members_pkey` if the user is
    /// already a member.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        data: CreateTeamMember,
    ) -> Result<Self, sqlx::Error> {
        let member = sqlx::query_as::<_, TeamMember>(
            r#"
            INSERT INTO team_members (team_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING team_id, user_id, role, created_at
            "#,
        )
        .bind(data.team_id)
        .bind(data.user_id)
        .bind(data.role)
        .fetch_one(executor)
        .await?;

        Ok(member)
    }

    /// Finds a membership
    pub async fn find<'e>(
        executor: impl PgExecutor<'e>,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let member = sqlx::query_as::<_, TeamMember>(
            r#"
            SELECT team_id, user_id, role, created_at
            FROM team_members
            WHERE team_id = $1 AND user_id = $2
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

        Ok(member)
    }

    /// Finds a membership and holds a share lock on it until the transaction ends
    ///
    /// Concurrent removal of the member waits for the lock.
    pub async fn find_for_share<'e>(
        executor: impl PgExecutor<'e>,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let member = sqlx::query_as::<_, TeamMember>(
            r#"
            SELECT team_id, user_id, role, created_at
            FROM team_members
            WHERE team_id = $1 AND user_id = $2
            FOR SHARE
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

        Ok(member)
    }

    /// Gets a user's role in a team, or `None` if not a member
    pub async fn get_role<'e>(
        executor: impl PgExecutor<'e>,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<TeamRole>, sqlx::Error> {
        let role: Option<TeamRole> = sqlx::query_scalar(
            r#"
            SELECT role FROM team_members
            WHERE team_id = $1 AND user_id = $2
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

        Ok(role)
    }

    /// Updates a member's role
    pub async fn update_role<'e>(
        executor: impl PgExecutor<'e>,
        team_id: Uuid,
        user_id: Uuid,
        role: TeamRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        let member = sqlx::query_as::<_, TeamMember>(
            r#"
            UPDATE team_members
            SET role = $3
            WHERE team_id = $1 AND user_id = $2
            RETURNING team_id, user_id, role, created_at
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .bind(role)
        .fetch_optional(executor)
        .await?;

        Ok(member)
    }

    /// Removes a membership
    ///
    /// Returns true if the membership existed.
    pub async fn delete<'e>(
        executor: impl PgExecutor<'e>,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM team_members WHERE team_id = $1 AND user_id = $2")
            .bind(team_id)
            .bind(user_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists the members of a team with their profiles, by join date
    pub async fn list_profiles<'e>(
        executor: impl PgExecutor<'e>,
        team_id: Uuid,
    ) -> Result<Vec<MemberProfile>, sqlx::Error> {
        let members = sqlx::query_as::<_, MemberProfile>(
            r#"
            SELECT m.user_id, u.name, u.email::text AS email, m.role, m.created_at AS joined_at
            FROM team_members m
            INNER JOIN users u ON u.id = m.user_id
            WHERE m.team_id = $1
            ORDER BY m.created_at ASC, u.name ASC
            "#,
        )
        .bind(team_id)
        .fetch_all(executor)
        .await?;

        Ok(members)
    }

    /// Counts the owners of a team
    pub async fn count_owners<'e>(
        executor: impl PgExecutor<'e>,
        team_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM team_members WHERE team_id = $1 AND role = 'owner'",
        )
        .bind(team_id)
        .fetch_one(executor)
        .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_hierarchy() {
        assert!(TeamRole::Owner.has_permission(&TeamRole::Owner));
        assert!(TeamRole::Owner.has_permission(&TeamRole::Member));
        assert!(TeamRole::Admin.has_permission(&TeamRole::Member));
        assert!(!TeamRole::Admin.has_permission(&TeamRole::Owner));
        assert!(!TeamRole::Member.has_permission(&TeamRole::Admin));
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(serde_json::to_string(&TeamRole::Admin).unwrap(), "\"admin\"");
        let role: TeamRole = serde_json::from_str("\"owner\"").unwrap();
        assert_eq!(role, TeamRole::Owner);
        assert_eq!(TeamRole::Member.as_str(), "member");
    }

    #[test]
    fn test_default_role() {
        let input: CreateTeamMember = serde_json::from_value(serde_json::json!({
            "team_id": Uuid::new_v4(),
            "user_id": Uuid::new_v4(),
        }))
        .unwrap();
        assert_eq!(input.role, TeamRole::Member);
    }
}
