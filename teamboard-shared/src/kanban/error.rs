/// Errors returned by Kanban core operations

use thiserror::Error;

/// Kanban operation errors
#[derive(Debug, Error)]
pub enum KanbanError {
    /// Malformed or inconsistent input; nothing was changed
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A referenced board, column, card, team, or user does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The operation conflicts with current state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl KanbanError {
    pub fn validation(message: impl Into<String>) -> Self {
        KanbanError::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        KanbanError::Conflict(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(KanbanError::NotFound("Card").to_string(), "Card not found");
        assert_eq!(
            KanbanError::conflict("column has cards").to_string(),
            "Conflict: column has cards"
        );
        assert_eq!(
            KanbanError::validation("bad order").to_string(),
            "Validation failed: bad order"
        );
    }
}
