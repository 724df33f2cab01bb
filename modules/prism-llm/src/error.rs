use prism_common::PrismError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
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

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<LlmError> for PrismError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::NoProviderAvailable => PrismError::NoProviderAvailable,
            LlmError::ProviderTimeout => PrismError::ProviderTimeout,
            LlmError::ProviderRateLimited => PrismError::ProviderRateLimited,
            LlmError::ResponseUnparseable(msg) => PrismError::ResponseUnparseable(msg),
            LlmError::BudgetExhausted => PrismError::BudgetExhausted,
            LlmError::Http(e) => PrismError::ResponseUnparseable(e.to_string()),
            LlmError::Json(e) => PrismError::ResponseUnparseable(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;
