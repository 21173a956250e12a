/// Team authorization checks
///
/// Every board, column, and card belongs to exactly one team, and access is
/// granted by team membership. Handlers resolve the owning team of the
/// resource first and then call one of these checks.
///
/// # Example
///
/// ```no_run
/// use teamboard_shared::auth::authorization::{check_role, require_membership};
/// use teamboard_shared::models::membership::TeamRole;
/// # use sqlx::PgPool;
/// # use uuid::Uuid;
///
/// # async fn example(pool: PgPool, team_id: Uuid, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// // Any member may read the board
/// let role = require_membership(&pool, team_id, user_id).await?;
///
/// // Only admins and owners may add members
/// check_role(role, TeamRole::Admin)?;
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::membership::{TeamMember, TeamRole};

/// Authorization error
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    #[error("Not a member of team {0}")]
    NotMember(Uuid),

    #[error("Insufficient permissions: requires {required:?}, has {actual:?}")]
    InsufficientRole { required: TeamRole, actual: TeamRole },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Fails unless the user is a member of the team; returns their role
pub async fn require_membership(
    pool: &PgPool,
    team_id: Uuid,
    user_id: Uuid,
) -> Result<TeamRole, AuthzError> {
    TeamMember::get_role(pool, team_id, user_id)
        .await?
        .ok_or(AuthzError::NotMember(team_id))
}

/// Fails unless `actual` is at least `required`
pub fn check_role(actual: TeamRole, required: TeamRole) -> Result<(), AuthzError> {
    if !actual.has_permission(&required) {
        return Err(AuthzError::InsufficientRole { required, actual });
    }
    Ok(())
}
