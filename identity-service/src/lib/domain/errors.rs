use thiserror::Error;

/// Error reported by persistence adapters.
///
/// Adapters only distinguish uniqueness conflicts from everything else; the
/// credential service decides what each means to the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return RepositoryError::UniqueViolation(
                    db_err.constraint().unwrap_or("unknown").to_string(),
                );
            }
        }
        RepositoryError::Database(err.to_string())
    }
}
