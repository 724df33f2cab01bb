use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use prism_common::{EnrichStats, MIN_CLUSTER_SIZE};
use prism_llm::{ArticleBias, BiasAnalysisArticle, LlmClient};
use prism_store::{ArticleBiasUpdate, BiasWriteBack, StoreGateway};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::Result;

/// §4.6 rate limit: at least this long between any two cluster analyses,
/// regardless of caller.
const MIN_INTERVAL_SINGLE: Duration = Duration::from_secs(1);

/// §4.6 rate limit: at least this long between analyses when sweeping
/// pending clusters in batch.
pub const MIN_INTERVAL_BATCH: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Analyzed,
    Failed,
    Skipped,
}

/// Per-cluster LLM bias analysis and write-back. The one writer of
/// per-article bias fields and cluster-level neutral summary / most-neutral
/// pick.
pub struct BiasAnalyzer {
    store: StoreGateway,
    llm: Arc<LlmClient>,
    last_call: Mutex<Option<Instant>>,
}

impl BiasAnalyzer {
    pub fn new(store: StoreGateway, llm: Arc<LlmClient>) -> Self {
        Self {
            store,
            llm,
            last_call: Mutex::new(None),
        }
    }

    pub async fn provider_available(&self) -> bool {
        self.llm.is_available().await
    }

    /// Analyse one cluster and write the result back in a single
    /// transaction. On LLM failure the cluster is still marked
    /// analysis-complete with a failure note, per the "don't retry in a
    /// tight loop" contract; a later operator sweep can reset it.
    pub async fn analyze_cluster(&self, cluster_id: Uuid) -> Result<AnalysisOutcome> {
        if !self.provider_available().await {
            return Ok(AnalysisOutcome::Skipped);
        }

        let members = self.store.get_cluster_members(cluster_id).await?;
        if members.len() < MIN_CLUSTER_SIZE {
            return Ok(AnalysisOutcome::Skipped);
        }

        let sources = self.store.list_sources().await?;
        let names: HashMap<Uuid, String> = sources.into_iter().map(|s| (s.id, s.name)).collect();
        let articles: Vec<BiasAnalysisArticle> = members
            .iter()
            .map(|a| BiasAnalysisArticle {
                article_id: a.id,
                source_name: names.get(&a.source_id).cloned().unwrap_or_default(),
                title: a.title.clone(),
                summary: a.summary.clone().unwrap_or_default(),
            })
            .collect();

        self.throttle().await;

        match self.llm.analyze_bias(&articles).await {
            Ok(result) => {
                let write_back = BiasWriteBack {
                    cluster_id,
                    article_updates: result.articles.iter().map(article_update).collect(),
                    neutral_summary: Some(result.neutral_summary),
                    most_neutral_article_id: Some(result.most_unbiased_article_id),
                };
                self.store.write_bias_analysis(write_back).await?;
                Ok(AnalysisOutcome::Analyzed)
            }
            Err(err) => {
                tracing::warn!(%err, %cluster_id, "bias analysis failed, marking cluster complete");
                self.store
                    .mark_bias_analysis_failed(cluster_id, &err.to_string())
                    .await?;
                Ok(AnalysisOutcome::Failed)
            }
        }
    }

    /// Sweep every cluster with `analysis_complete = false`, spaced at
    /// least `MIN_INTERVAL_BATCH` apart.
    pub async fn analyze_pending(&self) -> Result<EnrichStats> {
        let mut stats = EnrichStats::default();
        if !self.provider_available().await {
            tracing::warn!("no LLM provider available, skipping pending bias sweep");
            return Ok(stats);
        }

        let pending = self.store.list_pending_clusters().await?;
        let mut first = true;
        for cluster in pending {
            if !first {
                tokio::time::sleep(MIN_INTERVAL_BATCH).await;
            }
            first = false;

            match self.analyze_cluster(cluster.id).await? {
                AnalysisOutcome::Analyzed => stats.clusters_analyzed += 1,
                AnalysisOutcome::Failed => stats.analyses_failed += 1,
                AnalysisOutcome::Skipped => {}
            }
        }
        Ok(stats)
    }

    async fn throttle(&self) {
        let mut guard = self.last_call.lock().await;
        if let Some(last) = *guard {
            let elapsed = last.elapsed();
            if elapsed < MIN_INTERVAL_SINGLE {
                tokio::time::sleep(MIN_INTERVAL_SINGLE - elapsed).await;
            }
        }
        *guard = Some(Instant::now());
    }
}

fn article_update(bias: &ArticleBias) -> ArticleBiasUpdate {
    ArticleBiasUpdate {
        article_id: bias.article_id,
        political_leaning: (bias.left_bias - bias.right_bias) / 10.0,
        sensationalism: bias.sensationalism / 10.0,
        framing_summary: bias.reasoning.clone(),
    }
}
