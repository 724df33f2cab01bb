use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::warn;
use uuid::Uuid;

use prism_common::{
    AiAnalysisJob, AiJobKind, AiJobStatus, AnalyticsOverview, Article, BiasHistogramBucket,
    BiasLabel, Blindspot, BlindspotKind, Cluster, CoverageRecord, Rating, RatingValue, Severity,
    Source, User, MAX_CLUSTER_SIZE,
};

use crate::error::{Result, StoreError};
use crate::rows::{
    AiJobRow, ArticleRow, BlindspotRow, ClusterRow, CoverageRow, RatingRow, SourceRow, TrendingRow,
    UserRow,
};

/// A newly-parsed feed entry, not yet persisted.
pub struct NewArticle {
    pub source_id: Uuid,
    pub title: String,
    pub canonical_link: String,
    pub summary: Option<String>,
    pub published_at: DateTime<Utc>,
    pub image_url: Option<String>,
    pub bias: BiasLabel,
}

/// Result of a cluster's bias analysis, ready to be written back in one
/// transaction.
pub struct BiasWriteBack {
    pub cluster_id: Uuid,
    pub article_updates: Vec<ArticleBiasUpdate>,
    pub neutral_summary: Option<String>,
    pub most_neutral_article_id: Option<Uuid>,
}

pub struct ArticleBiasUpdate {
    pub article_id: Uuid,
    pub political_leaning: f64,
    pub sensationalism: f64,
    pub framing_summary: String,
}

#[derive(Clone)]
pub struct StoreGateway {
    pool: PgPool,
}

impl StoreGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    // --- Sources ---

    /// Bulk-upsert by feed URL; used by `seed-sources`.
    pub async fn upsert_source(
        &self,
        name: &str,
        home_url: &str,
        feed_url: &str,
        bias: BiasLabel,
    ) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO sources (name, home_url, feed_url, bias)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (feed_url) DO UPDATE
                SET name = EXCLUDED.name, home_url = EXCLUDED.home_url, bias = EXCLUDED.bias
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(home_url)
        .bind(feed_url)
        .bind(bias.to_string())
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn list_sources(&self) -> Result<Vec<Source>> {
        let rows: Vec<SourceRow> = sqlx::query_as("SELECT * FROM sources ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Source::try_from).collect()
    }

    /// Sources eligible for ingestion and clustering (known bias, non-empty feed URL).
    pub async fn list_eligible_sources(&self) -> Result<Vec<Source>> {
        let rows: Vec<SourceRow> = sqlx::query_as(
            "SELECT * FROM sources WHERE bias != 'unknown' AND feed_url != '' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Source::try_from).collect()
    }

    // --- Articles: insert + source-timestamp update (transaction boundary a) ---

    /// Dedupes by canonical link. Returns `None` if the link already
    /// exists. Updates the source's `last_fetched_at` in the same
    /// transaction regardless of whether a new row was inserted, so a feed
    /// with zero new entries still records that it was polled.
    pub async fn insert_article_if_new(
        &self,
        new_article: NewArticle,
        fetched_at: DateTime<Utc>,
    ) -> Result<Option<Article>> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM articles WHERE canonical_link = $1",
        )
        .bind(&new_article.canonical_link)
        .fetch_optional(&mut *tx)
        .await?;

        let inserted = if existing.is_some() {
            None
        } else {
            let row: ArticleRow = sqlx::query_as(
                r#"
                INSERT INTO articles
                    (source_id, title, canonical_link, summary, published_at, image_url, bias)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
                "#,
            )
            .bind(new_article.source_id)
            .bind(&new_article.title)
            .bind(&new_article.canonical_link)
            .bind(&new_article.summary)
            .bind(new_article.published_at)
            .bind(&new_article.image_url)
            .bind(new_article.bias.to_string())
            .fetch_one(&mut *tx)
            .await?;
            Some(Article::try_from(row)?)
        };

        sqlx::query("UPDATE sources SET last_fetched_at = $1 WHERE id = $2")
            .bind(fetched_at)
            .bind(new_article.source_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(inserted)
    }

    pub async fn get_article(&self, id: Uuid) -> Result<Option<Article>> {
        let row: Option<ArticleRow> = sqlx::query_as("SELECT * FROM articles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Article::try_from).transpose()
    }

    pub async fn get_articles_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Article>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<ArticleRow> = sqlx::query_as("SELECT * FROM articles WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Article::try_from).collect()
    }

    /// A balanced sample of unclustered articles: at most `limit` total (−1 =
    /// unlimited) and at most `per_source` per source, ordered ascending by
    /// id so cluster assembly tie-breaks are stable.
    pub async fn list_unclustered_articles(
        &self,
        limit: i64,
        per_source: i64,
    ) -> Result<Vec<Article>> {
        let rows: Vec<ArticleRow> = sqlx::query_as(
            r#"
            SELECT * FROM (
                SELECT a.*, row_number() OVER (
                    PARTITION BY a.source_id ORDER BY a.id ASC
                ) AS rn
                FROM articles a
                WHERE a.cluster_id IS NULL
            ) ranked
            WHERE ranked.rn <= $1
            ORDER BY ranked.id ASC
            LIMIT CASE WHEN $2 < 0 THEN NULL ELSE $2 END
            "#,
        )
        .bind(per_source)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Article::try_from).collect()
    }

    /// Unclustered articles from other sources published within the last
    /// `hours`, for the incremental ingestion path.
    pub async fn list_recent_unclustered_articles(
        &self,
        since: DateTime<Utc>,
        exclude_source: Uuid,
    ) -> Result<Vec<Article>> {
        let rows: Vec<ArticleRow> = sqlx::query_as(
            r#"
            SELECT * FROM articles
            WHERE cluster_id IS NULL AND published_at >= $1 AND source_id != $2
            ORDER BY id ASC
            "#,
        )
        .bind(since)
        .bind(exclude_source)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Article::try_from).collect()
    }

    /// Already-clustered articles from other sources published within the
    /// last `hours`, for the incremental ingestion path's "attach to an
    /// existing cluster" branch.
    pub async fn list_recent_clustered_articles(
        &self,
        since: DateTime<Utc>,
        exclude_source: Uuid,
    ) -> Result<Vec<Article>> {
        let rows: Vec<ArticleRow> = sqlx::query_as(
            r#"
            SELECT * FROM articles
            WHERE cluster_id IS NOT NULL AND published_at >= $1 AND source_id != $2
            ORDER BY id ASC
            "#,
        )
        .bind(since)
        .bind(exclude_source)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Article::try_from).collect()
    }

    pub async fn mark_article_indexed(&self, article_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE articles SET indexed = TRUE WHERE id = $1")
            .bind(article_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Bias-analyzed articles awaiting their first (or a refreshed) index
    /// write — documents are created/refreshed only after bias analysis
    /// succeeds (§6).
    pub async fn list_articles_pending_index(&self) -> Result<Vec<Article>> {
        let rows: Vec<ArticleRow> = sqlx::query_as(
            "SELECT * FROM articles WHERE bias_analyzed = TRUE AND indexed = FALSE ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Article::try_from).collect()
    }

    // --- Clusters: creation + membership assignment (transaction boundary b) ---

    /// Persists a new cluster and assigns membership to its articles in one
    /// transaction. Enforces source uniqueness and the size bound defensively
    /// even though the caller (Clustering Engine) has already screened the
    /// candidate set; any
    /// violation aborts the whole transaction and leaves every member
    /// article unclustered (per §7, "leave the article unclustered; the
    /// next pass will retry").
    pub async fn create_cluster(
        &self,
        display_name: &str,
        master_article_id: Uuid,
        member_ids: &[Uuid],
    ) -> Result<Uuid> {
        if member_ids.len() < 2 {
            return Err(StoreError::ConstraintViolation(
                "cluster must have at least 2 members".to_string(),
            ));
        }
        if member_ids.len() > MAX_CLUSTER_SIZE {
            return Err(StoreError::ConstraintViolation(format!(
                "cluster would have {} members, exceeding {}",
                member_ids.len(),
                MAX_CLUSTER_SIZE
            )));
        }

        let mut tx = self.pool.begin().await?;

        let distinct_sources: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT source_id) FROM articles WHERE id = ANY($1)",
        )
        .bind(member_ids)
        .fetch_one(&mut *tx)
        .await?;
        if distinct_sources != member_ids.len() as i64 {
            tx.rollback().await?;
            return Err(StoreError::ConstraintViolation(
                "candidate cluster violates source uniqueness".to_string(),
            ));
        }

        let cluster_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO article_groups (display_name, master_article_id)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(display_name)
        .bind(master_article_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE articles SET cluster_id = $1 WHERE id = ANY($2)")
            .bind(cluster_id)
            .bind(member_ids)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(cluster_id)
    }

    /// Attaches a single article to an existing cluster (incremental
    /// ingestion path). Checks source uniqueness and the size bound inside
    /// the transaction; returns
    /// `ConstraintViolation` without mutating anything if either would be
    /// broken.
    pub async fn attach_article_to_cluster(
        &self,
        article_id: Uuid,
        cluster_id: Uuid,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let article_source: Uuid =
            sqlx::query_scalar("SELECT source_id FROM articles WHERE id = $1")
                .bind(article_id)
                .fetch_one(&mut *tx)
                .await?;

        let same_source_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM articles WHERE cluster_id = $1 AND source_id = $2",
        )
        .bind(cluster_id)
        .bind(article_source)
        .fetch_one(&mut *tx)
        .await?;
        if same_source_count > 0 {
            tx.rollback().await?;
            return Err(StoreError::ConstraintViolation(
                "source already represented in cluster".to_string(),
            ));
        }

        let current_size: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE cluster_id = $1")
                .bind(cluster_id)
                .fetch_one(&mut *tx)
                .await?;
        if current_size >= MAX_CLUSTER_SIZE as i64 {
            tx.rollback().await?;
            return Err(StoreError::ConstraintViolation(
                "cluster at capacity".to_string(),
            ));
        }

        sqlx::query("UPDATE articles SET cluster_id = $1 WHERE id = $2")
            .bind(cluster_id)
            .bind(article_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_cluster(&self, id: Uuid) -> Result<Option<Cluster>> {
        let row: Option<ClusterRow> = sqlx::query_as("SELECT * FROM article_groups WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Cluster::from))
    }

    pub async fn get_cluster_members(&self, cluster_id: Uuid) -> Result<Vec<Article>> {
        let rows: Vec<ArticleRow> = sqlx::query_as(
            "SELECT * FROM articles WHERE cluster_id = $1 ORDER BY published_at DESC",
        )
        .bind(cluster_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Article::try_from).collect()
    }

    pub async fn list_pending_clusters(&self) -> Result<Vec<Cluster>> {
        let rows: Vec<ClusterRow> = sqlx::query_as(
            "SELECT * FROM article_groups WHERE analysis_complete = FALSE ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Cluster::from).collect())
    }

    /// Every cluster, unpaginated. Used by the cleanup pass and the
    /// coverage/blindspot sweep, which both need the full set rather than a
    /// page of it.
    pub async fn list_all_clusters(&self) -> Result<Vec<Cluster>> {
        let rows: Vec<ClusterRow> = sqlx::query_as("SELECT * FROM article_groups")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Cluster::from).collect())
    }

    pub async fn list_clusters(&self, offset: i64, limit: i64) -> Result<Vec<Cluster>> {
        let rows: Vec<ClusterRow> = sqlx::query_as(
            "SELECT * FROM article_groups ORDER BY created_at DESC OFFSET $1 LIMIT $2",
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Cluster::from).collect())
    }

    // --- Bias analysis write-back (transaction boundary c) ---

    pub async fn write_bias_analysis(&self, write_back: BiasWriteBack) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for update in &write_back.article_updates {
            sqlx::query(
                r#"
                UPDATE articles
                SET political_leaning = $1, sensationalism = $2,
                    framing_summary = $3, bias_analyzed = TRUE
                WHERE id = $4
                "#,
            )
            .bind(update.political_leaning)
            .bind(update.sensationalism)
            .bind(&update.framing_summary)
            .bind(update.article_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            UPDATE article_groups
            SET neutral_summary = $1, most_neutral_article_id = $2,
                analysis_complete = TRUE, bias_summary = NULL
            WHERE id = $3
            "#,
        )
        .bind(&write_back.neutral_summary)
        .bind(write_back.most_neutral_article_id)
        .bind(write_back.cluster_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// §4.6 step 4: LLM failure still marks the cluster complete so it is
    /// not retried in a tight loop.
    pub async fn mark_bias_analysis_failed(&self, cluster_id: Uuid, note: &str) -> Result<()> {
        sqlx::query(
            "UPDATE article_groups SET analysis_complete = TRUE, bias_summary = $1 WHERE id = $2",
        )
        .bind(format!("Analysis failed: {note}"))
        .bind(cluster_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// An operator-initiated sweep resetting a cluster for re-analysis.
    pub async fn reset_analysis_complete(&self, cluster_id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE article_groups SET analysis_complete = FALSE, bias_summary = NULL WHERE id = $1",
        )
        .bind(cluster_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // --- Cleanup pass (transaction boundary d) ---

    /// Delete a singleton cluster, ungrouping its one remaining member.
    pub async fn dissolve_cluster(&self, cluster_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE articles SET cluster_id = NULL WHERE cluster_id = $1")
            .bind(cluster_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM article_groups WHERE id = $1")
            .bind(cluster_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Ungroups a specific set of articles without touching the cluster row
    /// (used by the duplicate-source and mega-cluster-truncation cleanup
    /// steps, which keep the cluster but drop some members).
    pub async fn ungroup_articles(&self, article_ids: &[Uuid]) -> Result<()> {
        if article_ids.is_empty() {
            return Ok(());
        }
        sqlx::query("UPDATE articles SET cluster_id = NULL WHERE id = ANY($1)")
            .bind(article_ids)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Splits a mega-cluster's membership into fresh clusters, one per
    /// bucket, inside a single transaction: the old cluster is deleted and
    /// its former members redistributed. `buckets` must already satisfy
    /// source uniqueness and the size bound per bucket (the Clustering
    /// Engine re-enforces both before calling this).
    pub async fn split_cluster(
        &self,
        old_cluster_id: Uuid,
        buckets: Vec<(String, Uuid, Vec<Uuid>)>,
    ) -> Result<Vec<Uuid>> {
        let mut tx = self.pool.begin().await?;
        let mut new_ids = Vec::with_capacity(buckets.len());

        for (display_name, master_article_id, member_ids) in buckets {
            let cluster_id: Uuid = sqlx::query_scalar(
                r#"
                INSERT INTO article_groups (display_name, master_article_id)
                VALUES ($1, $2)
                RETURNING id
                "#,
            )
            .bind(&display_name)
            .bind(master_article_id)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query("UPDATE articles SET cluster_id = $1 WHERE id = ANY($2)")
                .bind(cluster_id)
                .bind(&member_ids)
                .execute(&mut *tx)
                .await?;

            new_ids.push(cluster_id);
        }

        sqlx::query("DELETE FROM article_groups WHERE id = $1")
            .bind(old_cluster_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(new_ids)
    }

    // --- Coverage ---

    pub async fn upsert_coverage(&self, record: &CoverageRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO story_coverage
                (cluster_id, left_count, center_count, right_count, total,
                 coverage_score, first_reported, last_updated)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (cluster_id) DO UPDATE SET
                left_count = EXCLUDED.left_count,
                center_count = EXCLUDED.center_count,
                right_count = EXCLUDED.right_count,
                total = EXCLUDED.total,
                coverage_score = EXCLUDED.coverage_score,
                last_updated = EXCLUDED.last_updated
            "#,
        )
        .bind(record.cluster_id)
        .bind(record.left_count as i32)
        .bind(record.center_count as i32)
        .bind(record.right_count as i32)
        .bind(record.total as i32)
        .bind(record.coverage_score)
        .bind(record.first_reported)
        .bind(record.last_updated)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_coverage(&self, cluster_id: Uuid) -> Result<Option<CoverageRecord>> {
        let row: Option<CoverageRow> =
            sqlx::query_as("SELECT * FROM story_coverage WHERE cluster_id = $1")
                .bind(cluster_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(CoverageRecord::from))
    }

    /// Read API's trending endpoint: clusters covered since `since`, with at
    /// least `min_coverage`, most recently updated first.
    pub async fn list_trending_clusters(
        &self,
        since: DateTime<Utc>,
        min_coverage: f64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<(Cluster, CoverageRecord)>> {
        let rows: Vec<TrendingRow> = sqlx::query_as(
            r#"
            SELECT
                g.id, g.display_name, g.master_article_id, g.most_neutral_article_id,
                g.neutral_summary, g.bias_summary, g.analysis_complete, g.created_at,
                c.left_count, c.center_count, c.right_count, c.total,
                c.coverage_score, c.first_reported, c.last_updated
            FROM article_groups g
            JOIN story_coverage c ON c.cluster_id = g.id
            WHERE c.last_updated >= $1 AND c.coverage_score >= $2
            ORDER BY c.last_updated DESC
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(since)
        .bind(min_coverage)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(<(Cluster, CoverageRecord)>::from).collect())
    }

    /// Read API's free-text search: title/summary match, filtered by
    /// timeframe and minimum coverage, newest first.
    pub async fn search_articles(
        &self,
        query: &str,
        since: DateTime<Utc>,
        min_coverage: f64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Article>> {
        let pattern = format!("%{}%", query.replace('%', "\\%").replace('_', "\\_"));
        let rows: Vec<ArticleRow> = sqlx::query_as(
            r#"
            SELECT a.* FROM articles a
            JOIN story_coverage c ON c.cluster_id = a.cluster_id
            WHERE (a.title ILIKE $1 OR a.summary ILIKE $1)
              AND c.coverage_score >= $2
              AND a.published_at >= $3
            ORDER BY a.published_at DESC
            OFFSET $4 LIMIT $5
            "#,
        )
        .bind(&pattern)
        .bind(min_coverage)
        .bind(since)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Article::try_from).collect()
    }

    /// Read API's analytics overview: cluster count, mean coverage score,
    /// and active (non-dismissed) blindspot count.
    pub async fn analytics_overview(&self) -> Result<AnalyticsOverview> {
        let total_clusters: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM article_groups")
            .fetch_one(&self.pool)
            .await?;
        let average_coverage: Option<f64> =
            sqlx::query_scalar("SELECT AVG(coverage_score) FROM story_coverage")
                .fetch_one(&self.pool)
                .await?;
        let blindspot_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM blindspots WHERE NOT dismissed")
                .fetch_one(&self.pool)
                .await?;
        Ok(AnalyticsOverview {
            total_clusters,
            average_coverage: average_coverage.unwrap_or(0.0),
            blindspot_count,
        })
    }

    /// Read API's bias distribution histogram: ten fixed-width buckets over
    /// `political_leaning ∈ [-1, 1]`, counting analysed articles.
    pub async fn bias_histogram(&self) -> Result<Vec<BiasHistogramBucket>> {
        const BUCKET_COUNT: usize = 10;
        const BUCKET_WIDTH: f64 = 2.0 / BUCKET_COUNT as f64;

        let rows: Vec<(Option<f64>,)> = sqlx::query_as(
            "SELECT political_leaning FROM articles WHERE bias_analyzed = TRUE",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut counts = vec![0i64; BUCKET_COUNT];
        for leaning in rows.into_iter().filter_map(|(l,)| l) {
            let idx = (((leaning + 1.0) / BUCKET_WIDTH) as isize)
                .clamp(0, BUCKET_COUNT as isize - 1) as usize;
            counts[idx] += 1;
        }

        Ok(counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| BiasHistogramBucket {
                range_start: -1.0 + i as f64 * BUCKET_WIDTH,
                range_end: -1.0 + (i + 1) as f64 * BUCKET_WIDTH,
                count,
            })
            .collect())
    }

    // --- Blindspots ---

    /// Does not duplicate an active (non-dismissed) blindspot for the same
    /// user/cluster; returns `None` if one already exists.
    pub async fn insert_blindspot_if_absent(
        &self,
        user_id: Uuid,
        cluster_id: Uuid,
        kind: BlindspotKind,
        severity: Severity,
        description: &str,
        suggested_sources: &[String],
    ) -> Result<Option<Uuid>> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM blindspots
            WHERE user_id = $1 AND cluster_id = $2 AND NOT dismissed
            "#,
        )
        .bind(user_id)
        .bind(cluster_id)
        .fetch_optional(&mut *tx)
        .await?;
        if existing.is_some() {
            tx.rollback().await?;
            return Ok(None);
        }

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO blindspots
                (user_id, cluster_id, kind, severity, description, suggested_sources)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(cluster_id)
        .bind(kind.to_string())
        .bind(severity.to_string())
        .bind(description)
        .bind(suggested_sources)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(id))
    }

    pub async fn list_blindspots_for_user(&self, user_id: Uuid) -> Result<Vec<Blindspot>> {
        let rows: Vec<BlindspotRow> = sqlx::query_as(
            "SELECT * FROM blindspots WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Blindspot::try_from).collect()
    }

    pub async fn dismiss_blindspot(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE blindspots SET dismissed = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // --- Users ---

    /// There's no per-user reading-history signal in the data model, so the
    /// Coverage Tracker's blindspot pass runs identically against every row
    /// here (see DESIGN.md).
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as("SELECT * FROM users ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    // --- Ratings ---

    pub async fn upsert_rating(
        &self,
        user_id: Uuid,
        cluster_id: Uuid,
        value: RatingValue,
    ) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO user_article_ratings (user_id, cluster_id, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, cluster_id) DO UPDATE SET value = EXCLUDED.value
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(cluster_id)
        .bind(value.to_string())
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn get_rating(&self, user_id: Uuid, cluster_id: Uuid) -> Result<Option<Rating>> {
        let row: Option<RatingRow> = sqlx::query_as(
            "SELECT * FROM user_article_ratings WHERE user_id = $1 AND cluster_id = $2",
        )
        .bind(user_id)
        .bind(cluster_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Rating::try_from).transpose()
    }

    // --- AI job bookkeeping (operator visibility only) ---

    pub async fn record_ai_job_started(
        &self,
        cluster_id: Option<Uuid>,
        article_id: Option<Uuid>,
        kind: AiJobKind,
    ) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO ai_analysis_jobs (cluster_id, article_id, kind, status)
            VALUES ($1, $2, $3, 'pending')
            RETURNING id
            "#,
        )
        .bind(cluster_id)
        .bind(article_id)
        .bind(kind.to_string())
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn record_ai_job_finished(
        &self,
        job_id: Uuid,
        status: AiJobStatus,
        error: Option<&str>,
    ) -> Result<()> {
        let status_str = match status {
            AiJobStatus::Pending => "pending",
            AiJobStatus::Succeeded => "succeeded",
            AiJobStatus::Failed => "failed",
        };
        sqlx::query(
            "UPDATE ai_analysis_jobs SET status = $1, error = $2, completed_at = now() WHERE id = $3",
        )
        .bind(status_str)
        .bind(error)
        .bind(job_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_recent_ai_jobs(&self, limit: i64) -> Result<Vec<AiAnalysisJob>> {
        let rows: Vec<AiJobRow> = sqlx::query_as(
            "SELECT * FROM ai_analysis_jobs ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(AiAnalysisJob::try_from).collect()
    }
}

/// Helper retained for callers that need an explicit transaction handle for
/// a sequence of store operations not covered by a single gateway method.
pub type StoreTx<'a> = Transaction<'a, Postgres>;

#[allow(dead_code)]
fn log_tx_warning(context: &str, err: &sqlx::Error) {
    warn!(context, error = %err, "store transaction failed");
}
