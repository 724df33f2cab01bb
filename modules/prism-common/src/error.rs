use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrismError {
    #[error("database error: {0}")]
    Database(String),

    #[error("search index error: {0}")]
    Index(String),

    #[error("feed unavailable: {0}")]
    FeedUnavailable(String),

    #[error("no LLM provider available")]
    NoProviderAvailable,

    #[error("LLM provider timed out")]
    ProviderTimeout,

    #[error("LLM provider rate limited")]
    ProviderRateLimited,

    #[error("LLM response could not be parsed: {0}")]
    ResponseUnparseable(String),

    #[error("daily LLM budget exhausted")]
    BudgetExhausted,

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PrismError>;
