use std::sync::Arc;

use async_trait::async_trait;
use prism_cluster::ClusterEnricher;
use uuid::Uuid;

use crate::analyzer::BiasAnalyzer;

/// Wires the Bias Analyzer into the Clustering Engine's "immediate
/// enrichment" hook (§4.5): a freshly-created cluster is analysed right
/// away if a provider is available, without the engine knowing anything
/// about bias analysis.
pub struct ImmediateBiasEnricher {
    analyzer: Arc<BiasAnalyzer>,
}

impl ImmediateBiasEnricher {
    pub fn new(analyzer: Arc<BiasAnalyzer>) -> Self {
        Self { analyzer }
    }
}

#[async_trait]
impl ClusterEnricher for ImmediateBiasEnricher {
    async fn enrich(&self, cluster_id: Uuid) {
        if let Err(err) = self.analyzer.analyze_cluster(cluster_id).await {
            tracing::warn!(%err, %cluster_id, "immediate bias enrichment failed");
        }
    }
}
