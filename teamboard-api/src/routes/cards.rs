/// Card endpoints
///
/// # Endpoints
///
/// - `POST /v1/cards` - Create a card in a column
/// - `GET /v1/cards/mine` - Cards assigned to the caller, by due date
/// - `GET /v1/cards/:card_id` - Card with assignee and full history
/// - `PUT /v1/cards/:card_id` - Update content fields
/// - `DELETE /v1/cards/:card_id` - Delete a card
/// - `POST /v1/cards/:card_id/move` - Move within or across columns

use super::{authorize_card, authorize_column};
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
use chrono::NaiveDate;
use serde::Deserialize;
use teamboard_shared::{
    auth::middleware::AuthContext,
    kanban::{self, CardDetail, NewCard},
    models::card::{AssignedCard, Card, Priority, UpdateCard},
};
use uuid::Uuid;
use validator::Validate;

const MAX_DESCRIPTION_LENGTH: usize = 10_000;

/// Create card request
///
/// ```json
/// {
///   "column_id": "...",
///   "title": "Write release notes",
///   "priority": "high",
///   "due_date": "2025-03-01"
/// }
/// ```
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCardRequest {
    pub column_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,

    #[validate(length(max = 10000, message = "Description must be at most 10000 characters"))]
    pub description: Option<String>,

    /// Defaults to `medium`
    #[serde(default)]
    pub priority: Priority,

    pub due_date: Option<NaiveDate>,

    pub assignee_id: Option<Uuid>,

    /// Position in the column; appended when absent
    #[validate(range(min = 0, message = "Order must not be negative"))]
    pub order: Option<i32>,
}

/// Update card request
///
/// Absent fields are left alone; `null` clears `description`, `due_date`,
/// and `assignee_id`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCardRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    pub priority: Option<Priority>,

    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,

    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<Uuid>>,
}

/// Move card request
#[derive(Debug, Deserialize, Validate)]
pub struct MoveCardRequest {
    /// Target column; may be the card's current column
    pub column_id: Uuid,

    /// Position in the target column; clamped to the column's bounds
    #[validate(range(min = 0, message = "Order must not be negative"))]
    pub order: Option<i32>,
}

impl UpdateCardRequest {
    fn into_changes(self) -> ApiResult<UpdateCard> {
        if let Some(Some(description)) = &self.description {
            if description.chars().count() > MAX_DESCRIPTION_LENGTH {
                return Err(ApiError::validation(
                    "description",
                    "Description must be at most 10000 characters",
                ));
            }
        }

        let changes = UpdateCard {
            title: self.title,
            description: self.description,
            priority: self.priority,
            due_date: self.due_date,
            assignee_id: self.assignee_id,
        };

        if changes.is_empty() {
            return Err(ApiError::validation("body", "No fields to update"));
        }

        Ok(changes)
    }
}

/// Create a card
pub async fn create_card(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<CreateCardRequest>,
) -> ApiResult<(StatusCode, Json<Card>)> {
    authorize_column(&state.db, req.column_id, auth.user_id).await?;

    let card = kanban::create_card(
        &state.db,
        NewCard {
            column_id: req.column_id,
            title: req.title,
            description: req.description,
            priority: req.priority,
            due_date: req.due_date,
            assignee_id: req.assignee_id,
            order: req.order,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(card)))
}

/// Cards assigned to the caller across all their teams
pub async fn my_cards(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<AssignedCard>>> {
    let cards = Card::list_for_assignee(&state.db, auth.user_id).await?;
    Ok(Json(cards))
}

/// Card with its assignee and full history, newest first
pub async fn get_card(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(card_id): Path<Uuid>,
) -> ApiResult<Json<CardDetail>> {
    authorize_card(&state.db, card_id, auth.user_id).await?;
    Ok(Json(kanban::get_card(&state.db, card_id).await?))
}

/// Update a card's content
pub async fn update_card(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(card_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateCardRequest>,
) -> ApiResult<Json<Card>> {
    let changes = req.into_changes()?;
    authorize_card(&state.db, card_id, auth.user_id).await?;

    let card = kanban::update_card(&state.db, card_id, changes).await?;
    Ok(Json(card))
}

/// Delete a card
pub async fn delete_card(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(card_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    authorize_card(&state.db, card_id, auth.user_id).await?;

    kanban::delete_card(&state.db, card_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Move a card
///
/// A move to another column records one history entry; a move within the
/// same column only reorders. The caller must belong to the teams of both
/// the card and the target column.
pub async fn move_card(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(card_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<MoveCardRequest>,
) -> ApiResult<Json<Card>> {
    authorize_card(&state.db, card_id, auth.user_id).await?;
    authorize_column(&state.db, req.column_id, auth.user_id).await?;

    let card = kanban::move_card(&state.db, card_id, req.column_id, req.order).await?;
    Ok(Json(card))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_card_accepts_priority_aliases() {
        let column_id = Uuid::new_v4();
        let json = format!(
            r#"{{"column_id": "{}", "title": "X", "priority": "alta"}}"#,
            column_id
        );

        let req: CreateCardRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(req.priority, Priority::High);
        assert_eq!(req.order, None);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_card_rejects_blank_title_and_negative_order() {
        let json = format!(
            r#"{{"column_id": "{}", "title": "", "order": -1}}"#,
            Uuid::new_v4()
        );

        let req: CreateCardRequest = serde_json::from_str(&json).unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("order"));
    }

    #[test]
    fn test_unknown_priority_is_rejected() {
        let json = format!(
            r#"{{"column_id": "{}", "title": "X", "priority": "urgent"}}"#,
            Uuid::new_v4()
        );
        assert!(serde_json::from_str::<CreateCardRequest>(&json).is_err());
    }

    #[test]
    fn test_update_card_request() {
        let req: UpdateCardRequest =
            serde_json::from_str(r#"{"assignee_id": null, "priority": "low"}"#).unwrap();
        let changes = req.into_changes().unwrap();
        assert_eq!(changes.assignee_id, Some(None));
        assert_eq!(changes.priority, Some(Priority::Low));
        assert_eq!(changes.due_date, None);

        let empty: UpdateCardRequest = serde_json::from_str("{}").unwrap();
        assert!(empty.into_changes().is_err());
    }
}
