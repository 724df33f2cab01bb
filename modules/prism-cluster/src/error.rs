pub type Result<T> = std::result::Result<T, ClusterError>;

#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("store error: {0}")]
    Store(#[from] prism_store::StoreError),
}

impl From<ClusterError> for prism_common::PrismError {
    fn from(e: ClusterError) -> Self {
        match e {
            ClusterError::Store(e) => prism_common::PrismError::from(e),
        }
    }
}
