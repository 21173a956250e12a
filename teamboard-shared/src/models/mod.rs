/// Database models for TeamBoard
///
/// Each model owns its table's SQL. Functions take any `PgExecutor`, so they
/// can run directly on the pool or inside a transaction.
///
/// # Models
///
/// - `user`: User accounts and authentication
/// - `team`: Teams that own boards
/// - `membership`: User-team relationships with roles
/// - `board`: Kanban boards
/// - `column`: Ordered board columns with a role
/// - `card`: Cards within columns
/// - `card_history`: Append-only log of cross-column moves
///
/// # Example
///
/// ```no_run
/// use teamboard_shared::models::user::{User, CreateUser};
/// use teamboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     name: "Jane Doe".to_string(),
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod board;
pub mod card;
pub mod card_history;
pub mod column;
pub mod membership;
pub mod team;
pub mod user;
