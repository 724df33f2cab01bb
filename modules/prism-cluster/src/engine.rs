use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use prism_common::{Article, EnrichStats};
use prism_embed::EmbeddingService;
use prism_llm::LlmClient;
use prism_store::StoreGateway;
use uuid::Uuid;

use crate::assembly::{assemble_clusters, ClusterFormation};
use crate::cascade::{embedding_filter, fallback_filter, llm_filter, semantic_candidates, CascadeThresholds};
use crate::error::Result;

/// Maximum articles per batch (`-1` = unlimited) and per source, matching
/// the Clustering Engine's input-bounding contract.
#[derive(Debug, Clone, Copy)]
pub struct BatchLimits {
    pub max_total: i64,
    pub max_per_source: i64,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_total: -1,
            max_per_source: 50,
        }
    }
}

/// Default incremental-ingestion lookback window, in hours.
pub const DEFAULT_INCREMENTAL_WINDOW_HOURS: i64 = 24;
pub const MAX_INCREMENTAL_WINDOW_HOURS: i64 = 48;

/// Hands a newly-created cluster off for bias analysis without creating a
/// dependency cycle between `prism-cluster` and `prism-bias` — the
/// scheduler wires a concrete implementation (wrapping the Bias Analyzer)
/// in at startup; tests use a no-op.
#[async_trait]
pub trait ClusterEnricher: Send + Sync {
    async fn enrich(&self, cluster_id: Uuid);
}

/// A `ClusterEnricher` that does nothing — used where immediate enrichment
/// isn't wired up (tests, or a provider-less deployment).
pub struct NullEnricher;

#[async_trait]
impl ClusterEnricher for NullEnricher {
    async fn enrich(&self, _cluster_id: Uuid) {}
}

pub struct ClusteringEngine {
    store: StoreGateway,
    llm: std::sync::Arc<LlmClient>,
    thresholds: CascadeThresholds,
}

impl ClusteringEngine {
    pub fn new(store: StoreGateway, llm: std::sync::Arc<LlmClient>, thresholds: CascadeThresholds) -> Self {
        Self {
            store,
            llm,
            thresholds,
        }
    }

    /// Full batch cascade: sample a balanced subset of unclustered
    /// articles, run the three-stage cascade, assemble and persist
    /// clusters, then hand each new cluster to `enricher`.
    pub async fn run_batch(
        &self,
        limits: BatchLimits,
        enricher: &dyn ClusterEnricher,
    ) -> Result<EnrichStats> {
        let mut stats = EnrichStats::default();

        let candidates = self
            .store
            .list_unclustered_articles(limits.max_total, limits.max_per_source)
            .await?;
        let eligible: Vec<Article> = candidates.into_iter().filter(|a| a.is_cluster_eligible()).collect();
        if eligible.len() < 2 {
            return Ok(stats);
        }

        let embeddings = self.embed_all(&eligible).await;

        let semantic_pairs = semantic_candidates(&eligible, &self.thresholds);
        let embedding_pairs = embedding_filter(&semantic_pairs, &embeddings, self.thresholds.tau_emb);

        let by_id: HashMap<Uuid, &Article> = eligible.iter().map(|a| (a.id, a)).collect();
        let graph = if self.llm.is_available().await {
            llm_filter(&embedding_pairs, &by_id, &self.llm, self.thresholds.tau_llm).await
        } else {
            tracing::warn!("no LLM provider available, clustering on semantic+embedding+fallback-similarity signal only");
            fallback_filter(
                &embedding_pairs,
                &by_id,
                self.thresholds.fallback_similarity,
                self.thresholds.tau_llm,
            )
        };

        let formations = assemble_clusters(&eligible, &graph);
        for formation in formations {
            self.persist_formation(&formation, enricher, &mut stats).await?;
        }

        Ok(stats)
    }

    /// Incremental path for a single freshly-ingested article: compare
    /// against unclustered articles from other sources published within
    /// the last `window_hours`. The first match that doesn't share a source
    /// already in the cluster and stays within the size bound attaches
    /// to the existing cluster; otherwise a new cluster forms iff another
    /// article matches with composite ≥ τ_sem and embedding ≥ τ_emb.
    pub async fn run_incremental(
        &self,
        article_id: Uuid,
        window_hours: i64,
        enricher: &dyn ClusterEnricher,
    ) -> Result<EnrichStats> {
        let mut stats = EnrichStats::default();
        let window_hours = window_hours.clamp(1, MAX_INCREMENTAL_WINDOW_HOURS);

        let Some(article) = self.store.get_article(article_id).await? else {
            return Ok(stats);
        };
        if !article.is_cluster_eligible() {
            return Ok(stats);
        }

        let since = Utc::now() - Duration::hours(window_hours);
        let mut pool = self
            .store
            .list_recent_unclustered_articles(since, article.source_id)
            .await?;
        pool.retain(|a| a.is_cluster_eligible());

        let mut clustered_pool = self
            .store
            .list_recent_clustered_articles(since, article.source_id)
            .await?;
        clustered_pool.retain(|a| a.is_cluster_eligible());

        if pool.is_empty() && clustered_pool.is_empty() {
            return Ok(stats);
        }

        let mut all = pool.clone();
        all.extend(clustered_pool.iter().cloned());
        all.push(article.clone());

        let embeddings = self.embed_all(&all).await;
        let semantic_pairs = semantic_candidates(&all, &self.thresholds);
        let embedding_pairs = embedding_filter(&semantic_pairs, &embeddings, self.thresholds.tau_emb);

        let by_id: HashMap<Uuid, &Article> = all.iter().map(|a| (a.id, a)).collect();
        let graph = if self.llm.is_available().await {
            llm_filter(&embedding_pairs, &by_id, &self.llm, self.thresholds.tau_llm).await
        } else {
            fallback_filter(
                &embedding_pairs,
                &by_id,
                self.thresholds.fallback_similarity,
                self.thresholds.tau_llm,
            )
        };

        let partners = graph.get(&article.id).cloned().unwrap_or_default();
        for partner_id in partners {
            let Some(partner) = clustered_pool.iter().find(|a| a.id == partner_id) else {
                continue;
            };
            if let Some(cluster_id) = partner.cluster_id {
                if self
                    .store
                    .attach_article_to_cluster(article.id, cluster_id)
                    .await
                    .is_ok()
                {
                    stats.articles_attached += 1;
                    return Ok(stats);
                }
            }
        }

        if let Some((a, b, _)) = semantic_pairs.iter().find(|(a, b, score)| {
            let other = if *a == article.id {
                Some(*b)
            } else if *b == article.id {
                Some(*a)
            } else {
                None
            };
            other.is_some_and(|o| pool.iter().any(|p| p.id == o)) && *score >= self.thresholds.tau_sem
        }) {
            let other = if *a == article.id { *b } else { *a };
            let embedded_ok = embedding_pairs.iter().any(|(x, y)| {
                (*x == article.id && *y == other) || (*y == article.id && *x == other)
            });
            if embedded_ok {
                let formation = ClusterFormation {
                    master_id: article.id.min(other),
                    member_ids: vec![article.id, other],
                };
                self.persist_formation(&formation, enricher, &mut stats).await?;
            }
        }

        Ok(stats)
    }

    async fn embed_all(&self, articles: &[Article]) -> HashMap<Uuid, Vec<f32>> {
        let embed_service = EmbeddingService::new(&self.llm);
        let mut embeddings = HashMap::with_capacity(articles.len());
        for article in articles {
            let vector = embed_service
                .embed_article(&article.title, article.summary.as_deref().unwrap_or(""))
                .await;
            embeddings.insert(article.id, vector);
        }
        embeddings
    }

    async fn persist_formation(
        &self,
        formation: &ClusterFormation,
        enricher: &dyn ClusterEnricher,
        stats: &mut EnrichStats,
    ) -> Result<()> {
        let Some(master) = self.store.get_article(formation.master_id).await? else {
            return Ok(());
        };
        match self
            .store
            .create_cluster(&master.title, formation.master_id, &formation.member_ids)
            .await
        {
            Ok(cluster_id) => {
                stats.clusters_created += 1;
                enricher.enrich(cluster_id).await;
            }
            Err(err) => {
                tracing::warn!(%err, "cluster creation rejected, leaving articles unclustered");
            }
        }
        Ok(())
    }
}
