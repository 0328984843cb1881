use error_common::{codes, RustCareError};
use thiserror::Error;

/// PostgreSQL SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl DatabaseError {
    /// Unique-constraint name when this error is a unique violation
    pub fn unique_violation(&self) -> Option<String> {
        match self {
            Self::SqlxError(sqlx::Error::Database(db)) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                Some(db.constraint().unwrap_or_default().to_string())
            }
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::ConnectionFailed(_) => codes::database::CONNECTION_FAILED,
            _ if self.unique_violation().is_some() => codes::database::CONSTRAINT_VIOLATION,
            _ => codes::database::QUERY_FAILED,
        }
    }
}

impl From<DatabaseError> for RustCareError {
    fn from(err: DatabaseError) -> Self {
        RustCareError::database(err.code(), err.to_string())
    }
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;
