use std::collections::HashSet;

use crate::extract::KeywordBag;

/// Jaccard similarity between two case-folded sets. Two empty sets are
/// defined as similarity 0 — "nothing in common" rather than "everything
/// in common", since an empty bag carries no signal either way.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// `exact_jaccard + 0.5 * partial_jaccard`, where a partial match is an
/// entity pair (one from each set, neither already exactly shared) where
/// one string contains the other — e.g. "maria alvarez" and "alvarez"
/// referring to the same person without matching exactly.
pub fn entity_score(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let exact: HashSet<&String> = a.intersection(b).collect();
    let union_size = a.union(b).count();
    if union_size == 0 {
        return 0.0;
    }
    let exact_jaccard = exact.len() as f64 / union_size as f64;

    let mut partial_matched: HashSet<&String> = HashSet::new();
    for x in a {
        if exact.contains(x) {
            continue;
        }
        for y in b {
            if exact.contains(y) || x == y {
                continue;
            }
            if x.contains(y.as_str()) || y.contains(x.as_str()) {
                partial_matched.insert(x);
                partial_matched.insert(y);
            }
        }
    }
    let partial_jaccard = partial_matched.len() as f64 / union_size as f64;

    exact_jaccard + 0.5 * partial_jaccard
}

/// Composite pairwise score in `[0, 1]`:
/// `0.3 * J(keywords) + 0.4 * J(topics) + 0.3 * entity_score`.
pub fn composite_score(a: &KeywordBag, b: &KeywordBag) -> f64 {
    let keyword_j = jaccard(&a.keywords, &b.keywords);
    let topic_j = jaccard(&a.topics, &b.topics);
    let entity = entity_score(&a.entities, &b.entities);
    0.3 * keyword_j + 0.4 * topic_j + 0.3 * entity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;

    #[test]
    fn identical_articles_score_near_one() {
        let text = "Senate passes election bill amid campaign fallout in Washington";
        let a = extract(text);
        let b = extract(text);
        let score = composite_score(&a, &b);
        assert!(score > 0.6, "expected high composite score, got {score}");
    }

    #[test]
    fn unrelated_articles_score_zero() {
        let a = extract("A quiet afternoon in the garden with tea and books");
        let b = extract("The championship match ended in a dramatic penalty shootout");
        assert_eq!(composite_score(&a, &b), 0.0);
    }

    #[test]
    fn partial_entity_match_contributes_less_than_exact() {
        let mut a = HashSet::new();
        a.insert("maria alvarez".to_string());
        let mut b_exact = HashSet::new();
        b_exact.insert("maria alvarez".to_string());
        let mut b_partial = HashSet::new();
        b_partial.insert("alvarez".to_string());

        let exact_score = entity_score(&a, &b_exact);
        let partial_score = entity_score(&a, &b_partial);
        assert!(partial_score < exact_score);
        assert!(partial_score > 0.0);
    }
}
