pub type Result<T> = std::result::Result<T, SchedulerError>;

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("store error: {0}")]
    Store(#[from] prism_store::StoreError),

    #[error("feed error: {0}")]
    Feed(#[from] prism_feed::FeedError),

    #[error("cluster error: {0}")]
    Cluster(#[from] prism_cluster::ClusterError),

    #[error("bias error: {0}")]
    Bias(#[from] prism_bias::BiasError),

    #[error("coverage error: {0}")]
    Coverage(#[from] prism_coverage::CoverageError),
}

impl From<SchedulerError> for prism_common::PrismError {
    fn from(e: SchedulerError) -> Self {
        match e {
            SchedulerError::Store(e) => prism_common::PrismError::from(e),
            SchedulerError::Feed(e) => prism_common::PrismError::from(e),
            SchedulerError::Cluster(e) => prism_common::PrismError::from(e),
            SchedulerError::Bias(e) => prism_common::PrismError::from(e),
            SchedulerError::Coverage(e) => prism_common::PrismError::from(e),
        }
    }
}
