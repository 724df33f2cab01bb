use async_trait::async_trait;
use prism_cluster::ClusterEnricher;
use uuid::Uuid;

/// Fans a newly-created cluster out to every wired enricher in order. Exists
/// because `ClusteringEngine::run_batch`/`run_incremental` each take a
/// single `&dyn ClusterEnricher`, but both the Bias Analyzer and the
/// Coverage Tracker need to react to cluster creation.
pub struct CompositeEnricher {
    enrichers: Vec<Box<dyn ClusterEnricher>>,
}

impl CompositeEnricher {
    pub fn new(enrichers: Vec<Box<dyn ClusterEnricher>>) -> Self {
        Self { enrichers }
    }
}

#[async_trait]
impl ClusterEnricher for CompositeEnricher {
    async fn enrich(&self, cluster_id: Uuid) {
        for enricher in &self.enrichers {
            enricher.enrich(cluster_id).await;
        }
    }
}
