use crawler_core::CrawlError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to start database runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("Invalid stored value: {0}")]
    InvalidValue(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl From<StoreError> for CrawlError {
    fn from(err: StoreError) -> Self {
        CrawlError::Store(err.to_string())
    }
}
