use async_trait::async_trait;
use chrono::{Duration, Utc};
use prism_cluster::ClusterEnricher;
use prism_common::{CoverageRecord, MIN_CLUSTER_SIZE};
use prism_store::StoreGateway;
use uuid::Uuid;

use crate::error::Result;
use crate::metrics::{blindspot_description, blindspot_for_missing, coverage_for_members, missing_buckets};

/// Blindspot derivation only considers clusters reported within this many
/// days (§4.7).
pub const BLINDSPOT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, Default)]
pub struct CoverageStats {
    pub clusters_updated: u64,
    pub blindspots_emitted: u64,
}

/// Coverage Tracker — the only writer of coverage records and
/// blindspots.
pub struct CoverageTracker {
    store: StoreGateway,
}

impl CoverageTracker {
    pub fn new(store: StoreGateway) -> Self {
        Self { store }
    }

    /// Recompute and store one cluster's coverage record from its current
    /// membership.
    pub async fn update_one(&self, cluster_id: Uuid) -> Result<Option<CoverageRecord>> {
        let members = self.store.get_cluster_members(cluster_id).await?;
        if members.is_empty() {
            return Ok(None);
        }
        let record = coverage_for_members(cluster_id, &members, Utc::now());
        self.store.upsert_coverage(&record).await?;
        Ok(Some(record))
    }

    /// Recompute coverage for every cluster, then derive blindspots for
    /// clusters reported within the last `BLINDSPOT_WINDOW_DAYS` days. Runs
    /// as a periodic sweep (driven by the scheduler at `T_enrich`) to catch
    /// membership changes from paths that don't carry an immediate
    /// enrichment hook — incremental attach and cleanup splits — on top of
    /// the immediate `ClusterEnricher` hook for newly-created clusters.
    pub async fn refresh_all(&self) -> Result<CoverageStats> {
        let mut stats = CoverageStats::default();
        let clusters = self.store.list_all_clusters().await?;
        let users = self.store.list_users().await?;
        let cutoff = Utc::now() - Duration::days(BLINDSPOT_WINDOW_DAYS);

        for cluster in clusters {
            let members = self.store.get_cluster_members(cluster.id).await?;
            if members.is_empty() {
                continue;
            }
            let record = coverage_for_members(cluster.id, &members, Utc::now());
            self.store.upsert_coverage(&record).await?;
            stats.clusters_updated += 1;

            if members.len() < MIN_CLUSTER_SIZE || record.first_reported < cutoff {
                continue;
            }
            let missing = missing_buckets(&record);
            let Some((kind, severity)) = blindspot_for_missing(&missing) else {
                continue;
            };
            let description = blindspot_description(kind, record.total);

            for user in &users {
                match self
                    .store
                    .insert_blindspot_if_absent(user.id, cluster.id, kind, severity, &description, &[])
                    .await?
                {
                    Some(_) => stats.blindspots_emitted += 1,
                    None => {}
                }
            }
        }

        Ok(stats)
    }
}

#[async_trait]
impl ClusterEnricher for CoverageTracker {
    async fn enrich(&self, cluster_id: Uuid) {
        if let Err(err) = self.update_one(cluster_id).await {
            tracing::warn!(%err, %cluster_id, "immediate coverage update failed");
        }
    }
}
