pub mod models;
pub mod pool;
pub mod repositories;

pub use pool::DatabasePool;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Corrupt row {id}: {message}")]
    CorruptRow { id: String, message: String },
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        DatabaseError::Query(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
