/// Column endpoints
///
/// # Endpoints
///
/// - `POST /v1/boards/:board_id/columns` - Create a column at a placement
/// - `PUT /v1/boards/:board_id/columns/order` - Reorder all columns
/// - `PUT /v1/columns/:column_id` - Update name, color, or role
/// - `DELETE /v1/columns/:column_id` - Delete an empty column

use super::{authorize_board, authorize_column};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{double_option, ValidatedJson},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use teamboard_shared::{
    auth::middleware::AuthContext,
    kanban::{self, NewColumn, Placement},
    models::column::{Column, ColumnRole, UpdateColumn},
};
use uuid::Uuid;
use validator::Validate;

const MAX_COLOR_LENGTH: usize = 32;

/// Create column request
///
/// ```json
/// {
///   "name": "Review",
///   "color": "#f59e0b",
///   "role": "custom",
///   "placement": { "mode": "before", "anchor_column_id": "..." }
/// }
/// ```
#[derive(Debug, Deserialize, Validate)]
pub struct CreateColumnRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,

    #[validate(length(max = 32, message = "Color must be at most 32 characters"))]
    pub color: Option<String>,

    /// Defaults to `custom`
    pub role: Option<ColumnRole>,

    /// Defaults to the end of the board
    #[serde(default)]
    pub placement: Placement,
}

/// Update column request
///
/// Absent fields are left alone; `"color": null` clears the color.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateColumnRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub color: Option<Option<String>>,

    pub role: Option<ColumnRole>,
}

/// Reorder request: every column id of the board, in the new order
#[derive(Debug, Deserialize, Validate)]
pub struct ReorderColumnsRequest {
    #[validate(length(min = 1, message = "At least one column id is required"))]
    pub column_ids: Vec<Uuid>,
}

impl UpdateColumnRequest {
    fn into_changes(self) -> ApiResult<UpdateColumn> {
        if let Some(Some(color)) = &self.color {
            if color.chars().count() > MAX_COLOR_LENGTH {
                return Err(ApiError::validation(
                    "color",
                    "Color must be at most 32 characters",
                ));
            }
        }

        Ok(UpdateColumn {
            name: self.name,
            color: self.color,
            role: self.role,
        })
    }
}

/// Create a column
pub async fn create_column(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<CreateColumnRequest>,
) -> ApiResult<(StatusCode, Json<Column>)> {
    authorize_board(&state.db, board_id, auth.user_id).await?;

    let column = kanban::create_column(
        &state.db,
        board_id,
        NewColumn {
            name: req.name,
            color: req.color,
            role: req.role,
            placement: req.placement,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(column)))
}

/// Reorder a board's columns
pub async fn reorder_columns(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<ReorderColumnsRequest>,
) -> ApiResult<Json<Vec<Column>>> {
    authorize_board(&state.db, board_id, auth.user_id).await?;

    let columns = kanban::reorder_columns(&state.db, board_id, &req.column_ids).await?;
    Ok(Json(columns))
}

/// Update a column's name, color, or role
pub async fn update_column(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(column_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateColumnRequest>,
) -> ApiResult<Json<Column>> {
    authorize_column(&state.db, column_id, auth.user_id).await?;

    let column = kanban::update_column(&state.db, column_id, req.into_changes()?).await?;
    Ok(Json(column))
}

/// Delete a column that has no cards
///
/// # Errors
///
/// - `409 Conflict`: The column still has cards
pub async fn delete_column(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(column_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    authorize_column(&state.db, column_id, auth.user_id).await?;

    kanban::delete_column(&state.db, column_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_column_request_defaults_to_end() {
        let req: CreateColumnRequest = serde_json::from_str(r#"{"name": "Review"}"#).unwrap();
        assert_eq!(req.placement, Placement::End);
        assert_eq!(req.role, None);
    }

    #[test]
    fn test_create_column_request_with_anchor() {
        let anchor = Uuid::new_v4();
        let json = format!(
            r#"{{"name": "Review", "role": "in_progress", "placement": {{"mode": "after", "anchor_column_id": "{}"}}}}"#,
            anchor
        );
        let req: CreateColumnRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(req.placement, Placement::After { anchor_column_id: anchor });
        assert_eq!(req.role, Some(ColumnRole::InProgress));
    }

    #[test]
    fn test_update_column_color_can_be_cleared() {
        let req: UpdateColumnRequest = serde_json::from_str(r#"{"color": null}"#).unwrap();
        let changes = req.into_changes().unwrap();
        assert_eq!(changes.color, Some(None));
        assert_eq!(changes.name, None);

        let req: UpdateColumnRequest =
            serde_json::from_str(&format!(r#"{{"color": "{}"}}"#, "x".repeat(40))).unwrap();
        assert!(req.into_changes().is_err());
    }
}
