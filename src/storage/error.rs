use sqlx::Error as SqlxError;
use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Sqlx(#[from] SqlxError),
    #[error("Invalid database url: {0}")]
    InvalidUrl(String),
}
