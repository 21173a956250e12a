/// Team and membership endpoints
///
/// # Endpoints
///
/// - `GET /v1/teams` - Teams of the current user
/// - `POST /v1/teams` - Create a team (caller becomes owner)
/// - `GET /v1/teams/:team_id` - Team with members (any member)
/// - `DELETE /v1/teams/:team_id` - Delete a team (owner)
/// - `POST /v1/teams/:team_id/members` - Add a member by email (admin+)
/// - `PUT /v1/teams/:team_id/members/:user_id` - Change a role (owner)
/// - `DELETE /v1/teams/:team_id/members/:user_id` - Remove a member
///   (admin+, or the member themselves)

use super::authorize_team;
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
    auth::{
        authorization::check_role,
        middleware::AuthContext,
    },
    kanban::{self, provisioning},
    models::{
        membership::{MemberProfile, TeamMember, TeamRole},
        team::Team,
    },
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Create team request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTeamRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,
}

/// Add member request
#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Defaults to `member`
    #[serde(default)]
    pub role: Option<TeamRole>,
}

/// Change role request
#[derive(Debug, Deserialize, Validate)]
pub struct ChangeRoleRequest {
    pub role: TeamRole,
}

/// Team with its members and the caller's role
#[derive(Debug, Serialize)]
pub struct TeamDetail {
    #[serde(flatten)]
    pub team: Team,
    pub role: TeamRole,
    pub members: Vec<MemberProfile>,
}

/// List the caller's teams, oldest first
pub async fn list_teams(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Team>>> {
    let teams = Team::list_for_user(&state.db, auth.user_id).await?;
    Ok(Json(teams))
}

/// Create a team with its default board
pub async fn create_team(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<CreateTeamRequest>,
) -> ApiResult<(StatusCode, Json<Team>)> {
    let team = provisioning::create_team(&state.db, auth.user_id, &req.name).await?;
    Ok((StatusCode::CREATED, Json(team)))
}

/// Get a team with its members
pub async fn get_team(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(team_id): Path<Uuid>,
) -> ApiResult<Json<TeamDetail>> {
    let (team, role) = authorize_team(&state.db, team_id, auth.user_id).await?;
    let members = TeamMember::list_profiles(&state.db, team_id).await?;

    Ok(Json(TeamDetail {
        team,
        role,
        members,
    }))
}

/// Delete a team and everything on its boards
pub async fn delete_team(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(team_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let (_, role) = authorize_team(&state.db, team_id, auth.user_id).await?;
    check_role(role, TeamRole::Owner)?;

    if !Team::delete(&state.db, team_id).await? {
        return Err(ApiError::NotFound("Team not found".to_string()));
    }

    info!(team_id = %team_id, user_id = %auth.user_id, "Team deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Add a registered user to a team
///
/// Only owners may add another owner.
pub async fn add_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(team_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<MemberProfile>)> {
    let (_, caller_role) = authorize_team(&state.db, team_id, auth.user_id).await?;

    let role = req.role.unwrap_or(TeamRole::Member);
    let required = if role == TeamRole::Owner {
        TeamRole::Owner
    } else {
        TeamRole::Admin
    };
    check_role(caller_role, required)?;

    let member = kanban::add_member(&state.db, team_id, &req.email, role).await?;

    Ok((StatusCode::CREATED, Json(member)))
}

/// Change a member's role
pub async fn update_member_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((team_id, user_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(req): ValidatedJson<ChangeRoleRequest>,
) -> ApiResult<Json<MemberProfile>> {
    let (_, caller_role) = authorize_team(&state.db, team_id, auth.user_id).await?;
    check_role(caller_role, TeamRole::Owner)?;

    let member = kanban::change_role(&state.db, team_id, user_id, req.role).await?;

    Ok(Json(member))
}

/// Remove a member
///
/// Members may always leave; removing someone else takes an admin, and
/// removing an owner takes an owner.
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((team_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let (_, caller_role) = authorize_team(&state.db, team_id, auth.user_id).await?;

    if user_id != auth.user_id {
        let target_role = TeamMember::get_role(&state.db, team_id, user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Member not found".to_string()))?;

        let required = if target_role == TeamRole::Owner {
            TeamRole::Owner
        } else {
            TeamRole::Admin
        };
        check_role(caller_role, required)?;
    }

    kanban::remove_member(&state.db, team_id, user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_member_request_defaults_role() {
        let req: AddMemberRequest =
            serde_json::from_str(r#"{"email": "bruno@example.com"}"#).unwrap();
        assert_eq!(req.role, None);
        assert!(req.validate().is_ok());

        let req: AddMemberRequest =
            serde_json::from_str(r#"{"email": "bruno@example.com", "role": "admin"}"#).unwrap();
        assert_eq!(req.role, Some(TeamRole::Admin));
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let result = serde_json::from_str::<ChangeRoleRequest>(r#"{"role": "boss"}"#);
        assert!(result.is_err());
    }
}
