use std::collections::{HashMap, HashSet};

use prism_common::Article;
use prism_embed::cosine_similarity;
use prism_keywords::{composite_score, extract, KeywordBag};
use prism_llm::LlmClient;
use uuid::Uuid;

/// Which formula stands in for the LLM similarity judgment when no
/// provider is available. `WeightedTitleContent` is the stricter of the
/// two (title alone overweights wire-service headline reuse across
/// unrelated stories) and is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackSimilarity {
    /// Jaccard similarity over title tokens only.
    TitleJaccard,
    /// 0.6 * title Jaccard + 0.4 * summary Jaccard.
    WeightedTitleContent,
}

impl Default for FallbackSimilarity {
    fn default() -> Self {
        FallbackSimilarity::WeightedTitleContent
    }
}

/// Thresholds governing the three cascade stages. Defaults match §4.5.
#[derive(Debug, Clone, Copy)]
pub struct CascadeThresholds {
    pub tau_sem: f64,
    pub tau_emb: f64,
    pub tau_llm: f64,
    pub top_m: usize,
    /// Formula used in place of stage 3 when no LLM provider is available.
    pub fallback_similarity: FallbackSimilarity,
}

impl Default for CascadeThresholds {
    fn default() -> Self {
        Self {
            tau_sem: prism_keywords::DEFAULT_TAU_SEM,
            tau_emb: prism_embed::DEFAULT_TAU_EMB,
            tau_llm: 0.75,
            top_m: prism_keywords::TOP_M_CANDIDATES,
            fallback_similarity: FallbackSimilarity::default(),
        }
    }
}

impl CascadeThresholds {
    pub fn strict() -> Self {
        Self {
            tau_emb: prism_embed::STRICT_TAU_EMB,
            ..Self::default()
        }
    }
}

/// Adjacency map from article id to the ids of articles that survived every
/// cascade stage against it, sorted ascending for deterministic walks.
pub type SurvivorGraph = HashMap<Uuid, Vec<Uuid>>;

/// Stage 1: keyword-bag composite score. Returns candidate pairs (i, j)
/// with i < j by id, restricted to cross-source pairs and each
/// article's top-M surviving partners by score.
pub fn semantic_candidates(
    articles: &[Article],
    thresholds: &CascadeThresholds,
) -> Vec<(Uuid, Uuid, f64)> {
    let bags: HashMap<Uuid, KeywordBag> = articles
        .iter()
        .map(|a| (a.id, extract(&format!("{} {}", a.title, a.summary.clone().unwrap_or_default()))))
        .collect();

    let mut sorted = articles.to_vec();
    sorted.sort_by_key(|a| a.id);

    let mut scored_by_article: HashMap<Uuid, Vec<(Uuid, f64)>> = HashMap::new();

    for (i, a) in sorted.iter().enumerate() {
        for b in sorted.iter().skip(i + 1) {
            if a.source_id == b.source_id {
                continue;
            }
            let score = composite_score(&bags[&a.id], &bags[&b.id]);
            if score >= thresholds.tau_sem {
                scored_by_article.entry(a.id).or_default().push((b.id, score));
                scored_by_article.entry(b.id).or_default().push((a.id, score));
            }
        }
    }

    let mut kept_pairs: Vec<(Uuid, Uuid, f64)> = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for (article_id, mut partners) in scored_by_article {
        partners.sort_by(|x, y| y.1.partial_cmp(&x.1).unwrap_or(std::cmp::Ordering::Equal).then(x.0.cmp(&y.0)));
        partners.truncate(thresholds.top_m);
        for (partner_id, score) in partners {
            let key = if article_id < partner_id {
                (article_id, partner_id)
            } else {
                (partner_id, article_id)
            };
            if seen.insert(key) {
                kept_pairs.push((key.0, key.1, score));
            }
        }
    }
    kept_pairs.sort();
    kept_pairs
}

/// Stage 2: cosine similarity over precomputed embeddings. `embeddings`
/// maps article id to its title+summary vector (empty vector = no signal,
/// never passes the threshold).
pub fn embedding_filter(
    pairs: &[(Uuid, Uuid, f64)],
    embeddings: &HashMap<Uuid, Vec<f32>>,
    threshold: f64,
) -> Vec<(Uuid, Uuid)> {
    pairs
        .iter()
        .filter_map(|(a, b, _)| {
            let empty = Vec::new();
            let va = embeddings.get(a).unwrap_or(&empty);
            let vb = embeddings.get(b).unwrap_or(&empty);
            let sim = cosine_similarity(va, vb);
            (sim >= threshold).then_some((*a, *b))
        })
        .collect()
}

fn token_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn jaccard(a: &str, b: &str) -> f64 {
    let set_a = token_set(a);
    let set_b = token_set(b);
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }
    let intersection = set_a.intersection(&set_b).count() as f64;
    let union = set_a.union(&set_b).count() as f64;
    intersection / union
}

fn fallback_score(a: &Article, b: &Article, formula: FallbackSimilarity) -> f64 {
    let title_sim = jaccard(&a.title, &b.title);
    match formula {
        FallbackSimilarity::TitleJaccard => title_sim,
        FallbackSimilarity::WeightedTitleContent => {
            let content_sim = jaccard(
                a.summary.as_deref().unwrap_or(""),
                b.summary.as_deref().unwrap_or(""),
            );
            0.6 * title_sim + 0.4 * content_sim
        }
    }
}

/// Stand-in for stage 3 when no LLM provider is available: re-scores each
/// stage-2 survivor with `formula` and keeps only pairs clearing
/// `threshold`, rather than letting every embedding survivor straight
/// through. Used for the provider-unavailable degradation path.
pub fn fallback_filter(
    pairs: &[(Uuid, Uuid)],
    articles: &HashMap<Uuid, &Article>,
    formula: FallbackSimilarity,
    threshold: f64,
) -> SurvivorGraph {
    let mut graph: SurvivorGraph = HashMap::new();
    for (a_id, b_id) in pairs {
        let (Some(a), Some(b)) = (articles.get(a_id), articles.get(b_id)) else {
            continue;
        };
        if fallback_score(a, b, formula) >= threshold {
            graph.entry(*a_id).or_default().push(*b_id);
            graph.entry(*b_id).or_default().push(*a_id);
        }
    }
    for partners in graph.values_mut() {
        partners.sort();
        partners.dedup();
    }
    graph
}

/// Stage 3: LLM similarity judgment, one call per surviving pair, in
/// deterministic (ascending a, then ascending b) order. A per-pair provider
/// error (timeout, rate limit, unparseable response) degrades that pair to
/// "no match" rather than a false positive; callers should check
/// `LlmClient::is_available` beforehand and skip this stage entirely if the
/// provider could not be selected at all.
pub async fn llm_filter(
    pairs: &[(Uuid, Uuid)],
    articles: &HashMap<Uuid, &Article>,
    llm: &LlmClient,
    threshold: f64,
) -> SurvivorGraph {
    let mut ordered = pairs.to_vec();
    ordered.sort();

    let mut graph: SurvivorGraph = HashMap::new();
    for (a_id, b_id) in ordered {
        let Some(a) = articles.get(&a_id) else { continue };
        let Some(b) = articles.get(&b_id) else { continue };
        let judgment = llm
            .judge_similarity(
                &a.title,
                a.summary.as_deref().unwrap_or(""),
                &b.title,
                b.summary.as_deref().unwrap_or(""),
            )
            .await;
        let is_match = match judgment {
            Ok(j) => j.is_match && j.similarity >= threshold,
            Err(err) => {
                tracing::debug!(%err, a = %a_id, b = %b_id, "similarity judgment failed, treating pair as no-match");
                false
            }
        };
        if is_match {
            graph.entry(a_id).or_default().push(b_id);
            graph.entry(b_id).or_default().push(a_id);
        }
    }
    for partners in graph.values_mut() {
        partners.sort();
        partners.dedup();
    }
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use prism_common::BiasLabel;

    fn article(id: Uuid, source: Uuid, title: &str, summary: &str) -> Article {
        Article {
            id,
            source_id: source,
            cluster_id: None,
            title: title.to_string(),
            canonical_link: format!("https://example.com/{id}"),
            summary: Some(summary.to_string()),
            published_at: Utc::now(),
            image_url: None,
            bias: BiasLabel::Left,
            indexed: false,
            bias_analyzed: false,
            political_leaning: None,
            sensationalism: None,
            framing_summary: None,
        }
    }

    #[test]
    fn keeps_cross_source_pairs_above_threshold_only() {
        let s1 = Uuid::new_v4();
        let s2 = Uuid::new_v4();
        let a = article(
            Uuid::new_v4(),
            s1,
            "Senate passes election reform bill",
            "Lawmakers in the Senate passed a sweeping election reform bill Tuesday",
        );
        let b = article(
            Uuid::new_v4(),
            s2,
            "Congress approves election bill",
            "The Senate approved election reform legislation in a close vote Tuesday",
        );
        let c = article(
            Uuid::new_v4(),
            s2,
            "Local team wins championship",
            "The hometown team celebrated a dramatic championship victory Saturday",
        );

        let pairs = semantic_candidates(&[a.clone(), b.clone(), c.clone()], &CascadeThresholds::default());
        let ids: Vec<(Uuid, Uuid)> = pairs.iter().map(|(x, y, _)| (*x, *y)).collect();
        let expected = if a.id < b.id { (a.id, b.id) } else { (b.id, a.id) };
        assert!(ids.contains(&expected));
    }

    #[test]
    fn excludes_same_source_pairs() {
        let s1 = Uuid::new_v4();
        let a = article(Uuid::new_v4(), s1, "Senate passes bill", "Election reform bill passes");
        let b = article(Uuid::new_v4(), s1, "Senate passes bill again", "Election reform bill passes in Senate");
        let pairs = semantic_candidates(&[a, b], &CascadeThresholds::default());
        assert!(pairs.is_empty());
    }

    #[test]
    fn embedding_filter_drops_pairs_with_empty_vectors() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let pairs = vec![(a, b, 0.5)];
        let embeddings = HashMap::new();
        let kept = embedding_filter(&pairs, &embeddings, 0.55);
        assert!(kept.is_empty());
    }

    #[test]
    fn embedding_filter_keeps_pairs_above_threshold() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let pairs = vec![(a, b, 0.5)];
        let mut embeddings = HashMap::new();
        embeddings.insert(a, vec![1.0, 0.0]);
        embeddings.insert(b, vec![1.0, 0.0]);
        let kept = embedding_filter(&pairs, &embeddings, 0.55);
        assert_eq!(kept, vec![(a, b)]);
    }

    #[test]
    fn fallback_filter_title_jaccard_ignores_summary_overlap() {
        let source_a = Uuid::new_v4();
        let source_b = Uuid::new_v4();
        let a = article(
            Uuid::new_v4(),
            source_a,
            "Senate passes election reform bill",
            "Completely unrelated summary text about agriculture.",
        );
        let b = article(
            Uuid::new_v4(),
            source_b,
            "Senate passes election reform bill",
            "A second, entirely different summary about shipping.",
        );
        let mut articles = HashMap::new();
        articles.insert(a.id, &a);
        articles.insert(b.id, &b);

        let graph = fallback_filter(
            &[(a.id, b.id)],
            &articles,
            FallbackSimilarity::TitleJaccard,
            0.75,
        );
        assert_eq!(graph.get(&a.id), Some(&vec![b.id]));
    }

    #[test]
    fn fallback_filter_weighted_title_content_is_stricter_than_title_alone() {
        let source_a = Uuid::new_v4();
        let source_b = Uuid::new_v4();
        let a = article(
            Uuid::new_v4(),
            source_a,
            "Senate passes election reform bill",
            "Lawmakers in the Senate passed a sweeping election reform bill Tuesday",
        );
        let b = article(
            Uuid::new_v4(),
            source_b,
            "Senate passes election reform bill",
            "A city council approved a new zoning ordinance for downtown parking",
        );
        let mut articles = HashMap::new();
        articles.insert(a.id, &a);
        articles.insert(b.id, &b);

        let by_title_only = fallback_filter(
            &[(a.id, b.id)],
            &articles,
            FallbackSimilarity::TitleJaccard,
            0.75,
        );
        let by_weighted = fallback_filter(
            &[(a.id, b.id)],
            &articles,
            FallbackSimilarity::WeightedTitleContent,
            0.75,
        );
        assert_eq!(by_title_only.get(&a.id), Some(&vec![b.id]));
        assert!(by_weighted.get(&a.id).is_none());
    }
}
