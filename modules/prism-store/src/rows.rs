use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use prism_common::{
    AiAnalysisJob, AiJobKind, AiJobStatus, Article, BiasLabel, Blindspot, BlindspotKind, Cluster,
    CoverageRecord, Rating, RatingValue, Severity, Source, User,
};

use crate::error::{Result, StoreError};

/// Raw row for the `sources` table; parses its text columns into domain enums.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct SourceRow {
    pub id: Uuid,
    pub name: String,
    pub home_url: String,
    pub feed_url: String,
    pub bias: String,
    pub last_fetched_at: Option<DateTime<Utc>>,
}

impl TryFrom<SourceRow> for Source {
    type Error = StoreError;
    fn try_from(row: SourceRow) -> Result<Self> {
        Ok(Source {
            id: row.id,
            name: row.name,
            home_url: row.home_url,
            feed_url: row.feed_url,
            bias: BiasLabel::from_str(&row.bias)
                .map_err(|e| StoreError::Other(anyhow::anyhow!(e)))?,
            last_fetched_at: row.last_fetched_at,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct ArticleRow {
    pub id: Uuid,
    pub source_id: Uuid,
    pub cluster_id: Option<Uuid>,
    pub title: String,
    pub canonical_link: String,
    pub summary: Option<String>,
    pub published_at: DateTime<Utc>,
    pub image_url: Option<String>,
    pub bias: String,
    pub indexed: bool,
    pub bias_analyzed: bool,
    pub political_leaning: Option<f64>,
    pub sensationalism: Option<f64>,
    pub framing_summary: Option<String>,
}

impl TryFrom<ArticleRow> for Article {
    type Error = StoreError;
    fn try_from(row: ArticleRow) -> Result<Self> {
        Ok(Article {
            id: row.id,
            source_id: row.source_id,
            cluster_id: row.cluster_id,
            title: row.title,
            canonical_link: row.canonical_link,
            summary: row.summary,
            published_at: row.published_at,
            image_url: row.image_url,
            bias: BiasLabel::from_str(&row.bias)
                .map_err(|e| StoreError::Other(anyhow::anyhow!(e)))?,
            indexed: row.indexed,
            bias_analyzed: row.bias_analyzed,
            political_leaning: row.political_leaning,
            sensationalism: row.sensationalism,
            framing_summary: row.framing_summary,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct ClusterRow {
    pub id: Uuid,
    pub display_name: String,
    pub master_article_id: Uuid,
    pub most_neutral_article_id: Option<Uuid>,
    pub neutral_summary: Option<String>,
    pub bias_summary: Option<String>,
    pub analysis_complete: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ClusterRow> for Cluster {
    fn from(row: ClusterRow) -> Self {
        Cluster {
            id: row.id,
            display_name: row.display_name,
            master_article_id: row.master_article_id,
            most_neutral_article_id: row.most_neutral_article_id,
            neutral_summary: row.neutral_summary,
            bias_summary: row.bias_summary,
            analysis_complete: row.analysis_complete,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct CoverageRow {
    pub cluster_id: Uuid,
    pub left_count: i32,
    pub center_count: i32,
    pub right_count: i32,
    pub total: i32,
    pub coverage_score: f64,
    pub first_reported: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl From<CoverageRow> for CoverageRecord {
    fn from(row: CoverageRow) -> Self {
        CoverageRecord {
            cluster_id: row.cluster_id,
            left_count: row.left_count as u32,
            center_count: row.center_count as u32,
            right_count: row.right_count as u32,
            total: row.total as u32,
            coverage_score: row.coverage_score,
            first_reported: row.first_reported,
            last_updated: row.last_updated,
        }
    }
}

/// Flattened join of `article_groups` and `story_coverage`, one row per
/// trending result.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct TrendingRow {
    pub id: Uuid,
    pub display_name: String,
    pub master_article_id: Uuid,
    pub most_neutral_article_id: Option<Uuid>,
    pub neutral_summary: Option<String>,
    pub bias_summary: Option<String>,
    pub analysis_complete: bool,
    pub created_at: DateTime<Utc>,
    pub left_count: i32,
    pub center_count: i32,
    pub right_count: i32,
    pub total: i32,
    pub coverage_score: f64,
    pub first_reported: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl From<TrendingRow> for (Cluster, CoverageRecord) {
    fn from(row: TrendingRow) -> Self {
        let cluster = Cluster {
            id: row.id,
            display_name: row.display_name,
            master_article_id: row.master_article_id,
            most_neutral_article_id: row.most_neutral_article_id,
            neutral_summary: row.neutral_summary,
            bias_summary: row.bias_summary,
            analysis_complete: row.analysis_complete,
            created_at: row.created_at,
        };
        let coverage = CoverageRecord {
            cluster_id: row.id,
            left_count: row.left_count as u32,
            center_count: row.center_count as u32,
            right_count: row.right_count as u32,
            total: row.total as u32,
            coverage_score: row.coverage_score,
            first_reported: row.first_reported,
            last_updated: row.last_updated,
        };
        (cluster, coverage)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct BlindspotRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub cluster_id: Uuid,
    pub kind: String,
    pub severity: String,
    pub description: String,
    pub suggested_sources: Vec<String>,
    pub dismissed: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<BlindspotRow> for Blindspot {
    type Error = StoreError;
    fn try_from(row: BlindspotRow) -> Result<Self> {
        Ok(Blindspot {
            id: row.id,
            user_id: row.user_id,
            cluster_id: row.cluster_id,
            kind: BlindspotKind::from_str(&row.kind)
                .map_err(|e| StoreError::Other(anyhow::anyhow!(e)))?,
            severity: Severity::from_str(&row.severity)
                .map_err(|e| StoreError::Other(anyhow::anyhow!(e)))?,
            description: row.description,
            suggested_sources: row.suggested_sources,
            dismissed: row.dismissed,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct RatingRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub cluster_id: Uuid,
    pub value: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<RatingRow> for Rating {
    type Error = StoreError;
    fn try_from(row: RatingRow) -> Result<Self> {
        let value = match row.value.as_str() {
            "helpful" => RatingValue::Helpful,
            "not_helpful" => RatingValue::NotHelpful,
            other => {
                return Err(StoreError::Other(anyhow::anyhow!(
                    "unknown rating value: {other}"
                )))
            }
        };
        Ok(Rating {
            id: row.id,
            user_id: row.user_id,
            cluster_id: row.cluster_id,
            value,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct AiJobRow {
    pub id: Uuid,
    pub cluster_id: Option<Uuid>,
    pub article_id: Option<Uuid>,
    pub kind: String,
    pub status: String,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<AiJobRow> for AiAnalysisJob {
    type Error = StoreError;
    fn try_from(row: AiJobRow) -> Result<Self> {
        let kind = match row.kind.as_str() {
            "bias_analysis" => AiJobKind::BiasAnalysis,
            "similarity_judgment" => AiJobKind::SimilarityJudgment,
            "embedding" => AiJobKind::Embedding,
            other => {
                return Err(StoreError::Other(anyhow::anyhow!(
                    "unknown AI job kind: {other}"
                )))
            }
        };
        let status = match row.status.as_str() {
            "pending" => AiJobStatus::Pending,
            "succeeded" => AiJobStatus::Succeeded,
            "failed" => AiJobStatus::Failed,
            other => {
                return Err(StoreError::Other(anyhow::anyhow!(
                    "unknown AI job status: {other}"
                )))
            }
        };
        Ok(AiAnalysisJob {
            id: row.id,
            cluster_id: row.cluster_id,
            article_id: row.article_id,
            kind,
            status,
            error: row.error,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}
