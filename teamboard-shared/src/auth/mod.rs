/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength checks
/// - [`jwt`]: JWT access/refresh token generation and validation
/// - [`middleware`]: Bearer token extraction and the request auth context
/// - [`authorization`]: Team membership and role checks
///
/// # Example
///
/// ```no_run
/// use teamboard_shared::auth::password::{hash_password, verify_password};
/// use teamboard_shared::auth::jwt::issue_token_pair;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("kanban-board-1")?;
/// assert!(verify_password("kanban-board-1", &hash)?);
///
/// let tokens = issue_token_pair(Uuid::new_v4(), "ana@example.com", "secret-key-of-at-least-32-bytes!")?;
/// assert_eq!(tokens.token_type, "Bearer");
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
