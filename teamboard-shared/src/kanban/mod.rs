/// Kanban core
///
/// - `ordering`: pure planners for dense column and card positions
/// - `columns` / `cards`: transactional column and card mutations
/// - `history`: card moves paired with their history records
/// - `members`: team membership changes
/// - `metrics`: board statistics
/// - `provisioning`: teams, default boards, and registration
/// - `board_view`: nested read model of a board
///
/// # Example
///
/// ```no_run
/// use teamboard_shared::kanban::{self, NewCard};
/// use teamboard_shared::models::card::Priority;
/// # use sqlx::PgPool;
/// # use uuid::Uuid;
///
/// # async fn example(pool: PgPool, board_id: Uuid, todo_id: Uuid, done_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let card = kanban::create_card(&pool, NewCard {
///     column_id: todo_id,
///     title: "Write release notes".to_string(),
///     priority: Priority::High,
///     ..Default::default()
/// }).await?;
///
/// kanban::move_card(&pool, card.id, done_id, None).await?;
///
/// let metrics = kanban::compute_metrics(&pool, board_id).await?;
/// assert_eq!(metrics.completed_count, 1);
/// # Ok(())
/// # }
/// ```

pub mod board_view;
pub mod cards;
pub mod columns;
pub mod error;
pub mod history;
pub mod members;
pub mod metrics;
pub mod ordering;
pub mod provisioning;

pub use board_view::{load_board, BoardDetail};
pub use cards::{create_card, delete_card, get_card, update_card, CardDetail, NewCard};
pub use columns::{create_column, delete_column, reorder_columns, update_column, NewColumn};
pub use error::KanbanError;
pub use history::move_card;
pub use members::{add_member, change_role, remove_member};
pub use metrics::{compute_metrics, MetricsSnapshot};
pub use ordering::Placement;
