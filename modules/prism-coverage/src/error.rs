pub type Result<T> = std::result::Result<T, CoverageError>;

#[derive(Debug, thiserror::Error)]
pub enum CoverageError {
    #[error("store error: {0}")]
    Store(#[from] prism_store::StoreError),
}

impl From<CoverageError> for prism_common::PrismError {
    fn from(e: CoverageError) -> Self {
        match e {
            CoverageError::Store(e) => prism_common::PrismError::from(e),
        }
    }
}
