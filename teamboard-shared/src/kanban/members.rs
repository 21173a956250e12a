/// Team membership changes
///
/// Every change locks the team row first, so the "at least one owner"
/// invariant holds under concurrent removals and demotions. Removing a
/// member also clears them as assignee on the team's cards. Who may make a
/// change is decided by the caller (see `auth::authorization`).

use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use super::error::KanbanError;
use crate::models::card::Card;
use crate::models::membership::{CreateTeamMember, MemberProfile, TeamMember, TeamRole};
use crate::models::team::Team;
use crate::models::user::User;

async fn lock_team(conn: &mut PgConnection, team_id: Uuid) -> Result<Team, KanbanError> {
    Team::lock(conn, team_id)
        .await?
        .ok_or(KanbanError::NotFound("Team"))
}

async fn ensure_not_last_owner(
    conn: &mut PgConnection,
    team_id: Uuid,
    member: &TeamMember,
) -> Result<(), KanbanError> {
    if member.role == TeamRole::Owner && TeamMember::count_owners(conn, team_id).await? <= 1 {
        return Err(KanbanError::conflict("a team must keep at least one owner"));
    }
    Ok(())
}

fn profile(user: User, member: TeamMember) -> MemberProfile {
    MemberProfile {
        user_id: user.id,
        name: user.name,
        email: user.email,
        role: member.role,
        joined_at: member.created_at,
    }
}

/// Adds the user registered under `email` to a team
///
/// # Errors
///
/// - `NotFound` if the team or the user does not exist
/// - `Conflict` if the user is already a member
pub async fn add_member(
    pool: &PgPool,
    team_id: Uuid,
    email: &str,
    role: TeamRole,
) -> Result<MemberProfile, KanbanError> {
    let mut tx = pool.begin().await?;
    lock_team(&mut tx, team_id).await?;

    let user = User::find_by_email(&mut *tx, email.trim())
        .await?
        .ok_or(KanbanError::NotFound("User"))?;

    let member = TeamMember::create(
        &mut *tx,
        CreateTeamMember {
            team_id,
            user_id: user.id,
            role,
        },
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.constraint() == Some("team_members_pkey") => {
            KanbanError::conflict("user is already a member of this team")
        }
        other => KanbanError::Database(other),
    })?;

    tx.commit().await?;

    info!(team_id = %team_id, user_id = %user.id, role = role.as_str(), "Member added");

    Ok(profile(user, member))
}

/// Removes a member from a team
///
/// # Errors
///
/// - `NotFound` if the team or the membership does not exist
/// - `Conflict` if the member is the team's last owner
///
/// Cards assigned to the member on the team's boards become unassigned.
pub async fn remove_member(pool: &PgPool, team_id: Uuid, user_id: Uuid) -> Result<(), KanbanError> {
    let mut tx = pool.begin().await?;
    lock_team(&mut tx, team_id).await?;

    let member = TeamMember::find(&mut *tx, team_id, user_id)
        .await?
        .ok_or(KanbanError::NotFound("Member"))?;
    ensure_not_last_owner(&mut tx, team_id, &member).await?;

    TeamMember::delete(&mut *tx, team_id, user_id).await?;
    let unassigned = Card::unassign_in_team(&mut *tx, team_id, user_id).await?;

    tx.commit().await?;

    info!(team_id = %team_id, user_id = %user_id, unassigned, "Member removed");

    Ok(())
}

/// Changes a member's role
///
/// # Errors
///
/// - `NotFound` if the team, the membership, or the user does not exist
/// - `Conflict` when demoting the team's last owner
pub async fn change_role(
    pool: &PgPool,
    team_id: Uuid,
    user_id: Uuid,
    role: TeamRole,
) -> Result<MemberProfile, KanbanError> {
    let mut tx = pool.begin().await?;
    lock_team(&mut tx, team_id).await?;

    let member = TeamMember::find(&mut *tx, team_id, user_id)
        .await?
        .ok_or(KanbanError::NotFound("Member"))?;
    if role != TeamRole::Owner {
        ensure_not_last_owner(&mut tx, team_id, &member).await?;
    }

    let member = TeamMember::update_role(&mut *tx, team_id, user_id, role)
        .await?
        .ok_or(KanbanError::NotFound("Member"))?;
    let user = User::find_by_id(&mut *tx, user_id)
        .await?
        .ok_or(KanbanError::NotFound("User"))?;

    tx.commit().await?;

    info!(team_id = %team_id, user_id = %user_id, role = role.as_str(), "Member role changed");

    Ok(profile(user, member))
}
