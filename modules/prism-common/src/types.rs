use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum members a cluster may hold.
pub const MAX_CLUSTER_SIZE: usize = 15;

/// Minimum members a cluster must hold to survive cleanup.
pub const MIN_CLUSTER_SIZE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BiasLabel {
    Unknown,
    Left,
    Center,
    Right,
}

impl std::fmt::Display for BiasLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BiasLabel::Unknown => write!(f, "unknown"),
            BiasLabel::Left => write!(f, "left"),
            BiasLabel::Center => write!(f, "center"),
            BiasLabel::Right => write!(f, "right"),
        }
    }
}

impl std::str::FromStr for BiasLabel {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "unknown" => Ok(Self::Unknown),
            "left" => Ok(Self::Left),
            "center" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            other => Err(format!("unknown BiasLabel: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BlindspotKind {
    LeftMissing,
    CenterMissing,
    RightMissing,
    Underreported,
}

impl std::fmt::Display for BlindspotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlindspotKind::LeftMissing => write!(f, "left_missing"),
            BlindspotKind::CenterMissing => write!(f, "center_missing"),
            BlindspotKind::RightMissing => write!(f, "right_missing"),
            BlindspotKind::Underreported => write!(f, "underreported"),
        }
    }
}

impl std::str::FromStr for BlindspotKind {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "left_missing" => Ok(Self::LeftMissing),
            "center_missing" => Ok(Self::CenterMissing),
            "right_missing" => Ok(Self::RightMissing),
            "underreported" => Ok(Self::Underreported),
            other => Err(format!("unknown BlindspotKind: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown Severity: {other}")),
        }
    }
}

/// A news outlet, labelled with a political leaning. Uniqueness is on
/// `feed_url`. Sources with `BiasLabel::Unknown` are skipped by ingestion
/// and clustering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: Uuid,
    pub name: String,
    pub home_url: String,
    pub feed_url: String,
    pub bias: BiasLabel,
    pub last_fetched_at: Option<DateTime<Utc>>,
}

impl Source {
    /// A source is eligible for ingestion and clustering only with a known bias.
    pub fn is_eligible(&self) -> bool {
        self.bias != BiasLabel::Unknown && !self.feed_url.is_empty()
    }
}

/// One entry from a source's feed. `canonical_link` is the dedupe key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub source_id: Uuid,
    pub cluster_id: Option<Uuid>,
    pub title: String,
    pub canonical_link: String,
    pub summary: Option<String>,
    pub published_at: DateTime<Utc>,
    pub image_url: Option<String>,
    /// Copied from the source at insertion time; rewritten only by an
    /// operator-initiated reseed.
    pub bias: BiasLabel,
    pub indexed: bool,
    pub bias_analyzed: bool,
    pub political_leaning: Option<f64>,
    pub sensationalism: Option<f64>,
    pub framing_summary: Option<String>,
}

impl Article {
    /// An article is eligible for the clustering cascade only once it has a
    /// summary of at least 20 characters.
    pub fn is_cluster_eligible(&self) -> bool {
        self.summary
            .as_ref()
            .map(|s| s.chars().count() >= 20)
            .unwrap_or(false)
    }

    /// Validate the score ranges an article must satisfy once analysed.
    pub fn scores_in_range(&self) -> bool {
        let leaning_ok = self
            .political_leaning
            .map(|v| (-1.0..=1.0).contains(&v))
            .unwrap_or(true);
        let sensationalism_ok = self
            .sensationalism
            .map(|v| (0.0..=1.0).contains(&v))
            .unwrap_or(true);
        leaning_ok && sensationalism_ok
    }
}

/// A set of articles judged to report on the same event, drawn from distinct
/// sources and bounded in size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub id: Uuid,
    pub display_name: String,
    pub master_article_id: Uuid,
    pub most_neutral_article_id: Option<Uuid>,
    pub neutral_summary: Option<String>,
    pub bias_summary: Option<String>,
    pub analysis_complete: bool,
    pub created_at: DateTime<Utc>,
}

/// Per-cluster derived counts, recomputed (never patched) after every
/// membership change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageRecord {
    pub cluster_id: Uuid,
    pub left_count: u32,
    pub center_count: u32,
    pub right_count: u32,
    pub total: u32,
    pub coverage_score: f64,
    pub first_reported: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl CoverageRecord {
    /// Coverage score must land in [0, 100].
    pub fn score_in_range(&self) -> bool {
        (0.0..=100.0).contains(&self.coverage_score)
    }
}

/// A per-user advisory that a cluster's coverage omits one or more
/// perspectives the user tends to read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blindspot {
    pub id: Uuid,
    pub user_id: Uuid,
    pub cluster_id: Uuid,
    pub kind: BlindspotKind,
    pub severity: Severity,
    pub description: String,
    pub suggested_sources: Vec<String>,
    pub dismissed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RatingValue {
    Helpful,
    NotHelpful,
}

impl std::fmt::Display for RatingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RatingValue::Helpful => write!(f, "helpful"),
            RatingValue::NotHelpful => write!(f, "not_helpful"),
        }
    }
}

/// A user's rating of a cluster's analysis, consumed only by the Read API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub id: Uuid,
    pub user_id: Uuid,
    pub cluster_id: Uuid,
    pub value: RatingValue,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AiJobKind {
    BiasAnalysis,
    SimilarityJudgment,
    Embedding,
}

impl std::fmt::Display for AiJobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AiJobKind::BiasAnalysis => write!(f, "bias_analysis"),
            AiJobKind::SimilarityJudgment => write!(f, "similarity_judgment"),
            AiJobKind::Embedding => write!(f, "embedding"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AiJobStatus {
    Pending,
    Succeeded,
    Failed,
}

/// A record of an LLM call made on behalf of a cluster or article, kept for
/// operator visibility; not read by the pipeline itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiAnalysisJob {
    pub id: Uuid,
    pub cluster_id: Option<Uuid>,
    pub article_id: Option<Uuid>,
    pub kind: AiJobKind,
    pub status: AiJobStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Read API aggregate: fleet-wide snapshot for the analytics overview
/// endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnalyticsOverview {
    pub total_clusters: i64,
    pub average_coverage: f64,
    pub blindspot_count: i64,
}

/// One bucket of the political-leaning histogram, `[range_start, range_end)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BiasHistogramBucket {
    pub range_start: f64,
    pub range_end: f64,
    pub count: i64,
}
