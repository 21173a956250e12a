/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register a new user with a personal team
/// - `POST /v1/auth/login` - Login and get tokens
/// - `POST /v1/auth/refresh` - Exchange a refresh token for an access token
/// - `GET /v1/auth/me` - Current user (authenticated)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ValidatedJson,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use teamboard_shared::{
    auth::{
        jwt::{self, TokenPair, TokenType},
        middleware::AuthContext,
        password,
    },
    kanban::provisioning::register_user,
    models::{
        team::Team,
        user::{CreateUser, User, UserSummary},
    },
};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Checked against the password policy after the field rules pass
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Refresh token request
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Response of register and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserSummary,

    /// The user's personal team
    pub team_id: Uuid,

    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Current user with their teams
#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: User,
    pub teams: Vec<Team>,
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid email or password".to_string())
}

/// Register a new user
///
/// Creates the user, a personal team named "<name>'s Team" owned by the
/// user, and the team's default board, in one transaction.
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// {
///   "email": "ana@example.com",
///   "password": "kanban42",
///   "name": "Ana"
/// }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed
/// - `409 Conflict`: Email already registered
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    password::validate_password_strength(&req.password)
        .map_err(|message| ApiError::validation("password", message))?;

    let password_hash = password::hash_password(&req.password)?;

    let (user, team) = register_user(
        &state.db,
        CreateUser {
            email: req.email.trim().to_string(),
            password_hash,
            name: req.name.trim().to_string(),
        },
    )
    .await?;

    let tokens = jwt::issue_token_pair(user.id, &user.email, state.jwt_secret())?;

    info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserSummary::from(&user),
            team_id: team.id,
            tokens,
        }),
    ))
}

/// Login with email and password
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email or wrong password (indistinguishable)
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let user = User::find_by_email(&state.db, req.email.trim())
        .await?
        .ok_or_else(invalid_credentials)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        warn!(user_id = %user.id, "Failed login attempt");
        return Err(invalid_credentials());
    }

    User::update_last_login(&state.db, user.id).await?;

    // Oldest team is the personal one created at registration
    let team_id = Team::list_for_user(&state.db, user.id)
        .await?
        .first()
        .map(|t| t.id)
        .unwrap_or(Uuid::nil());

    let tokens = jwt::issue_token_pair(user.id, &user.email, state.jwt_secret())?;

    info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse {
        user: UserSummary::from(&user),
        team_id,
        tokens,
    }))
}

/// Exchange a refresh token for a new access token
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid, expired, or non-refresh token, or the user
///   no longer exists
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let claims = jwt::validate_refresh_token(&req.refresh_token, state.jwt_secret())?;

    if User::find_by_id(&state.db, claims.sub).await?.is_none() {
        return Err(ApiError::Unauthorized("User no longer exists".to_string()));
    }

    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: TokenType::Access.default_expiration().num_seconds(),
    }))
}

/// Current user profile and team list
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MeResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))?;

    let teams = Team::list_for_user(&state.db, user.id).await?;

    Ok(Json(MeResponse { user, teams }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            email: "ana@example.com".to_string(),
            password: "kanban42".to_string(),
            name: "Ana".to_string(),
        };
        assert!(valid.validate().is_ok());

        let invalid = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "kanban42".to_string(),
            name: String::new(),
        };
        let errors = invalid.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("name"));
    }

    #[test]
    fn test_auth_response_flattens_tokens() {
        let response = AuthResponse {
            user: UserSummary {
                id: Uuid::nil(),
                name: "Ana".to_string(),
                email: "ana@example.com".to_string(),
            },
            team_id: Uuid::nil(),
            tokens: TokenPair {
                access_token: "a".to_string(),
                refresh_token: "r".to_string(),
                token_type: "Bearer".to_string(),
                expires_in: 86400,
            },
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["access_token"], "a");
        assert_eq!(json["token_type"], "Bearer");
        assert_eq!(json["user"]["name"], "Ana");
    }
}
