pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("search index error: {0}")]
    Index(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<StoreError> for prism_common::PrismError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(m) => prism_common::PrismError::Database(m),
            StoreError::ConstraintViolation(m) => prism_common::PrismError::ConstraintViolation(m),
            StoreError::Database(e) => prism_common::PrismError::Database(e.to_string()),
            StoreError::Migration(e) => prism_common::PrismError::Database(e.to_string()),
            StoreError::Index(m) => prism_common::PrismError::Index(m),
            StoreError::Other(e) => prism_common::PrismError::Anyhow(e),
        }
    }
}
