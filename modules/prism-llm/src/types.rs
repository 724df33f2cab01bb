use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One article handed to the bias-analysis prompt. Intentionally narrow —
/// only what the LLM needs to judge framing, not the full store row.
#[derive(Debug, Clone, Serialize)]
pub struct BiasAnalysisArticle {
    pub article_id: Uuid,
    pub source_name: String,
    pub title: String,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BiasAnalysisRequest {
    pub articles: Vec<BiasAnalysisArticle>,
}

/// Raw shape of the model's JSON response, before range-clamping and
/// missing-article defaulting is applied.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBiasAnalysisResponse {
    #[serde(rename = "mostUnbiasedArticleId")]
    pub most_unbiased_article_id: Option<Uuid>,
    #[serde(rename = "neutralSummary")]
    pub neutral_summary: Option<String>,
    pub articles: Vec<RawArticleBias>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawArticleBias {
    #[serde(rename = "articleId")]
    pub article_id: Uuid,
    #[serde(rename = "biasScore")]
    pub bias_score: Option<f64>,
    #[serde(rename = "leftBias")]
    pub left_bias: Option<f64>,
    #[serde(rename = "rightBias")]
    pub right_bias: Option<f64>,
    pub sensationalism: Option<f64>,
    pub reasoning: Option<String>,
}

/// Final, validated bias analysis: every requested article has an entry,
/// every score is clamped to 0-10, and a missing article is filled in with
/// the neutral defaults described in the bias-analysis contract.
#[derive(Debug, Clone, Serialize)]
pub struct BiasAnalysisResult {
    pub most_unbiased_article_id: Uuid,
    pub neutral_summary: String,
    pub articles: Vec<ArticleBias>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArticleBias {
    pub article_id: Uuid,
    pub bias_score: f64,
    pub left_bias: f64,
    pub right_bias: f64,
    pub sensationalism: f64,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimilarityRequest {
    pub title_a: String,
    pub content_a: String,
    pub title_b: String,
    pub content_b: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimilarityJudgment {
    pub similarity: f64,
    #[serde(rename = "isMatch")]
    pub is_match: bool,
    pub reasoning: String,
}

/// Clamp every score in a raw response into `[0, 10]` and fill in a neutral
/// default entry for any requested article the model dropped from its
/// response.
pub fn reconcile_bias_response(
    requested: &[BiasAnalysisArticle],
    raw: RawBiasAnalysisResponse,
) -> BiasAnalysisResult {
    let clamp10 = |v: Option<f64>| v.unwrap_or(5.0).clamp(0.0, 10.0);

    let mut by_id: std::collections::HashMap<Uuid, RawArticleBias> = raw
        .articles
        .into_iter()
        .map(|a| (a.article_id, a))
        .collect();

    let articles: Vec<ArticleBias> = requested
        .iter()
        .map(|req| match by_id.remove(&req.article_id) {
            Some(raw) => ArticleBias {
                article_id: raw.article_id,
                bias_score: clamp10(raw.bias_score),
                left_bias: clamp10(raw.left_bias),
                right_bias: clamp10(raw.right_bias),
                sensationalism: clamp10(raw.sensationalism),
                reasoning: raw.reasoning.unwrap_or_default(),
            },
            None => ArticleBias {
                article_id: req.article_id,
                bias_score: 5.0,
                left_bias: 0.0,
                right_bias: 0.0,
                sensationalism: 0.0,
                reasoning: "not analysed".to_string(),
            },
        })
        .collect();

    // Determinism: the most-neutral pick is always recomputed as the argmax
    // of biasScore, ties broken by smallest article id — the model's own
    // mostUnbiasedArticleId is prompt-contract output, not authoritative.
    let most_unbiased_article_id = articles
        .iter()
        .fold(None::<&ArticleBias>, |best, candidate| match best {
            None => Some(candidate),
            Some(current) if candidate.bias_score > current.bias_score => Some(candidate),
            Some(current)
                if candidate.bias_score == current.bias_score
                    && candidate.article_id < current.article_id =>
            {
                Some(candidate)
            }
            Some(current) => Some(current),
        })
        .map(|a| a.article_id)
        .unwrap_or_else(Uuid::nil);

    BiasAnalysisResult {
        most_unbiased_article_id,
        neutral_summary: raw.neutral_summary.unwrap_or_default(),
        articles,
    }
}
