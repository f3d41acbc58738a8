//! Database-specific error types and conversions.

use flowline_core::error::FlowlineError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity}")]
    AlreadyExists { entity: String },
}

impl From<DbError> for FlowlineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => FlowlineError::NotFound { entity, id },
            DbError::AlreadyExists { entity } => FlowlineError::AlreadyExists { entity },
            other => FlowlineError::Database(other.to_string()),
        }
    }
}
