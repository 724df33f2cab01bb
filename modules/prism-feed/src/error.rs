pub type Result<T> = std::result::Result<T, FeedError>;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("feed unavailable: {0}")]
    Unavailable(String),

    #[error("store error: {0}")]
    Store(#[from] prism_store::StoreError),
}

impl From<FeedError> for prism_common::PrismError {
    fn from(e: FeedError) -> Self {
        match e {
            FeedError::Unavailable(m) => prism_common::PrismError::FeedUnavailable(m),
            FeedError::Store(e) => prism_common::PrismError::from(e),
        }
    }
}
