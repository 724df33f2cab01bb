pub type Result<T> = std::result::Result<T, BiasError>;

#[derive(Debug, thiserror::Error)]
pub enum BiasError {
    #[error("store error: {0}")]
    Store(#[from] prism_store::StoreError),
}

impl From<BiasError> for prism_common::PrismError {
    fn from(e: BiasError) -> Self {
        match e {
            BiasError::Store(e) => prism_common::PrismError::from(e),
        }
    }
}
