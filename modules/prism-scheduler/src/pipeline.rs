use std::sync::Arc;

use futures::stream::{self, StreamExt};
use prism_bias::BiasAnalyzer;
use prism_cluster::{BatchLimits, CascadeThresholds, ClusterEnricher, ClusteringEngine};
use prism_common::{EnrichStats, IngestStats};
use prism_coverage::CoverageTracker;
use prism_feed::FeedReader;
use prism_llm::LlmClient;
use prism_store::{SearchIndex, StoreGateway};

use crate::error::Result;

/// Bounded parallelism for feed fetches (§5: `min(|sources|, 8)`).
const MAX_CONCURRENT_FETCHES: usize = 8;

/// Incremental clustering's lookback window, in hours.
const INCREMENTAL_WINDOW_HOURS: i64 = 24;

/// Everything one scheduler tick needs: the store, the cascade engine, the
/// bias/coverage sweepers, and the search index. Owns no scheduling state —
/// `Scheduler` is the only thing that knows about timers and shutdown.
pub struct Pipeline {
    store: StoreGateway,
    feed_reader: Arc<FeedReader>,
    cluster_engine: ClusteringEngine,
    bias: Arc<BiasAnalyzer>,
    coverage: Arc<CoverageTracker>,
    index: Arc<dyn SearchIndex>,
    enricher: Arc<dyn ClusterEnricher>,
    batch_limits: BatchLimits,
}

impl Pipeline {
    pub fn new(
        store: StoreGateway,
        llm: Arc<LlmClient>,
        index: Arc<dyn SearchIndex>,
        enricher: Arc<dyn ClusterEnricher>,
        thresholds: CascadeThresholds,
        batch_limits: BatchLimits,
    ) -> Self {
        let feed_reader = Arc::new(FeedReader::new(store.clone()));
        let cluster_engine = ClusteringEngine::new(store.clone(), Arc::clone(&llm), thresholds);
        let bias = Arc::new(BiasAnalyzer::new(store.clone(), Arc::clone(&llm)));
        let coverage = Arc::new(CoverageTracker::new(store.clone()));
        Self {
            store,
            feed_reader,
            cluster_engine,
            bias,
            coverage,
            index,
            enricher,
            batch_limits,
        }
    }

    /// `T_ingest`: fetch every eligible source, bounded parallelism,
    /// per-source entries processed sequentially by `FeedReader` itself.
    pub async fn run_ingest(&self) -> Result<IngestStats> {
        let sources = self.store.list_eligible_sources().await?;
        let concurrency = sources.len().min(MAX_CONCURRENT_FETCHES).max(1);

        let reader = Arc::clone(&self.feed_reader);
        let stats = stream::iter(sources)
            .map(|source| {
                let reader = Arc::clone(&reader);
                async move { reader.fetch_source(&source).await }
            })
            .buffer_unordered(concurrency)
            .fold(IngestStats::default(), |mut acc, item| async move {
                acc += item;
                acc
            })
            .await;

        tracing::info!(
            fetched = stats.fetched,
            inserted = stats.inserted,
            skipped_duplicate = stats.skipped_duplicate,
            skipped_invalid = stats.skipped_invalid,
            "ingest tick complete"
        );
        Ok(stats)
    }

    /// `T_enrich`: the Clustering Engine's incremental path over every
    /// unclustered article, then the Bias Analyzer's pending-cluster sweep,
    /// then the Coverage Tracker's full sweep, then the index sweep.
    ///
    /// The coverage sweep is placed here as the periodic leg of coverage's
    /// two-tier update strategy (the immediate leg already runs via
    /// `enricher` on cluster creation); the index sweep follows because both
    /// only have work once bias analysis has written a cluster's articles.
    pub async fn run_enrich(&self) -> Result<EnrichStats> {
        let mut stats = EnrichStats::default();

        let unclustered = self
            .store
            .list_unclustered_articles(self.batch_limits.max_total, self.batch_limits.max_per_source)
            .await?;
        for article in unclustered {
            stats += self
                .cluster_engine
                .run_incremental(article.id, INCREMENTAL_WINDOW_HOURS, self.enricher.as_ref())
                .await?;
        }

        let bias_stats = self.bias.analyze_pending().await?;
        stats += bias_stats;

        let coverage_stats = self.coverage.refresh_all().await?;
        stats.clusters_updated += coverage_stats.clusters_updated;

        let indexed = crate::indexer::index_pending(&self.store, self.index.as_ref()).await?;
        tracing::info!(
            clusters_created = stats.clusters_created,
            articles_attached = stats.articles_attached,
            clusters_analyzed = stats.clusters_analyzed,
            analyses_failed = stats.analyses_failed,
            coverage_updated = coverage_stats.clusters_updated,
            blindspots_emitted = coverage_stats.blindspots_emitted,
            indexed,
            "enrich tick complete"
        );
        Ok(stats)
    }

    /// A full batch cascade over all unclustered articles, used by the
    /// operator CLI's one-shot `enrich`/`full` commands rather than the
    /// periodic incremental path.
    pub async fn run_batch_cluster(&self) -> Result<EnrichStats> {
        let stats = self
            .cluster_engine
            .run_batch(self.batch_limits, self.enricher.as_ref())
            .await?;
        Ok(stats)
    }

    /// One-shot `enrich`: the batch cascade in place of the periodic
    /// incremental path, then the same bias/coverage/index sweeps as
    /// `run_enrich`. Backs the operator CLI's `enrich` and `full` commands.
    pub async fn run_enrich_once(&self) -> Result<EnrichStats> {
        let mut stats = self.run_batch_cluster().await?;

        let bias_stats = self.bias.analyze_pending().await?;
        stats += bias_stats;

        let coverage_stats = self.coverage.refresh_all().await?;
        stats.clusters_updated += coverage_stats.clusters_updated;

        let indexed = crate::indexer::index_pending(&self.store, self.index.as_ref()).await?;
        tracing::info!(
            clusters_created = stats.clusters_created,
            articles_attached = stats.articles_attached,
            clusters_analyzed = stats.clusters_analyzed,
            analyses_failed = stats.analyses_failed,
            coverage_updated = coverage_stats.clusters_updated,
            blindspots_emitted = coverage_stats.blindspots_emitted,
            indexed,
            "one-shot enrich complete"
        );
        Ok(stats)
    }

    /// `T_cleanup`: repair duplicate-source membership, undersized clusters,
    /// and mega-clusters across every cluster.
    pub async fn run_cleanup(&self) -> Result<EnrichStats> {
        let stats =
            prism_cluster::cleanup(&self.store, prism_cluster::cleanup::DEFAULT_H_HOURS).await?;
        tracing::info!(
            clusters_dissolved = stats.clusters_dissolved,
            clusters_split = stats.clusters_split,
            articles_ungrouped = stats.articles_ungrouped,
            "cleanup tick complete"
        );
        Ok(stats)
    }

    /// Sequential ingest -> enrich -> cleanup, for the CLI's `full` command.
    pub async fn run_full(&self) -> Result<(IngestStats, EnrichStats, EnrichStats)> {
        let ingest = self.run_ingest().await?;
        let enrich = self.run_enrich_once().await?;
        let cleanup = self.run_cleanup().await?;
        Ok((ingest, enrich, cleanup))
    }
}
