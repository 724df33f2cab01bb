use std::collections::HashSet;

use chrono::{DateTime, Utc};
use prism_common::{Article, BiasLabel, BlindspotKind, CoverageRecord, Severity};
use uuid::Uuid;

/// Pure function of cluster membership + source bias, per the "coverage as
/// derived state" rule: always recompute from the current member set,
/// never patch a stored record incrementally.
pub fn coverage_for_members(cluster_id: Uuid, members: &[Article], now: DateTime<Utc>) -> CoverageRecord {
    let left = members.iter().filter(|a| a.bias == BiasLabel::Left).count() as u32;
    let center = members.iter().filter(|a| a.bias == BiasLabel::Center).count() as u32;
    let right = members.iter().filter(|a| a.bias == BiasLabel::Right).count() as u32;
    let total = members.len() as u32;

    let bias_balance = [left, center, right].iter().filter(|&&count| count > 0).count() as f64;
    let bias_score = 100.0 * bias_balance / 3.0;

    let distinct_sources = members.iter().map(|a| a.source_id).collect::<HashSet<_>>().len() as f64;
    let source_diversity = if total == 0 {
        0.0
    } else {
        100.0 * (distinct_sources / total as f64).min(1.0)
    };

    let coverage_score = (0.7 * bias_score + 0.3 * source_diversity).round().clamp(0.0, 100.0);

    let first_reported = members
        .iter()
        .map(|a| a.published_at)
        .min()
        .unwrap_or(now);

    CoverageRecord {
        cluster_id,
        left_count: left,
        center_count: center,
        right_count: right,
        total,
        coverage_score,
        first_reported,
        last_updated: now,
    }
}

/// Bias buckets with zero coverage in this record.
pub fn missing_buckets(record: &CoverageRecord) -> Vec<BiasLabel> {
    let mut missing = Vec::new();
    if record.left_count == 0 {
        missing.push(BiasLabel::Left);
    }
    if record.center_count == 0 {
        missing.push(BiasLabel::Center);
    }
    if record.right_count == 0 {
        missing.push(BiasLabel::Right);
    }
    missing
}

/// §4.7 blindspot derivation: one missing bucket emits a `{bucket}_missing`
/// blindspot at medium severity; two or more emit `underreported` at high
/// severity. A fully-covered cluster emits nothing.
pub fn blindspot_for_missing(missing: &[BiasLabel]) -> Option<(BlindspotKind, Severity)> {
    match missing.len() {
        0 => None,
        1 => match missing[0] {
            BiasLabel::Left => Some((BlindspotKind::LeftMissing, Severity::Medium)),
            BiasLabel::Center => Some((BlindspotKind::CenterMissing, Severity::Medium)),
            BiasLabel::Right => Some((BlindspotKind::RightMissing, Severity::Medium)),
            BiasLabel::Unknown => None,
        },
        _ => Some((BlindspotKind::Underreported, Severity::High)),
    }
}

pub fn blindspot_description(kind: BlindspotKind, total: u32) -> String {
    match kind {
        BlindspotKind::LeftMissing => "This story has no coverage from left-leaning sources.".to_string(),
        BlindspotKind::CenterMissing => "This story has no coverage from center sources.".to_string(),
        BlindspotKind::RightMissing => "This story has no coverage from right-leaning sources.".to_string(),
        BlindspotKind::Underreported => format!(
            "This story is covered by only one political perspective across {total} article(s)."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn article(bias: BiasLabel, source_id: Uuid, published_at: DateTime<Utc>) -> Article {
        Article {
            id: Uuid::new_v4(),
            source_id,
            cluster_id: None,
            title: "t".to_string(),
            canonical_link: "https://example.com/a".to_string(),
            summary: Some("summary".to_string()),
            published_at,
            image_url: None,
            bias,
            indexed: false,
            bias_analyzed: false,
            political_leaning: None,
            sensationalism: None,
            framing_summary: None,
        }
    }

    #[test]
    fn full_coverage_scores_one_hundred() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let members = vec![
            article(BiasLabel::Left, Uuid::new_v4(), now),
            article(BiasLabel::Center, Uuid::new_v4(), now),
            article(BiasLabel::Right, Uuid::new_v4(), now),
        ];
        let record = coverage_for_members(Uuid::new_v4(), &members, now);
        assert_eq!(record.coverage_score, 100.0);
        assert!(missing_buckets(&record).is_empty());
    }

    #[test]
    fn missing_center_emits_center_missing_blindspot() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let members = vec![
            article(BiasLabel::Left, Uuid::new_v4(), now),
            article(BiasLabel::Right, Uuid::new_v4(), now),
        ];
        let record = coverage_for_members(Uuid::new_v4(), &members, now);
        let missing = missing_buckets(&record);
        assert_eq!(missing, vec![BiasLabel::Center]);
        let (kind, severity) = blindspot_for_missing(&missing).unwrap();
        assert_eq!(kind, BlindspotKind::CenterMissing);
        assert_eq!(severity, Severity::Medium);
    }

    #[test]
    fn single_perspective_is_underreported_at_high_severity() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let same_source = Uuid::new_v4();
        let members = vec![
            article(BiasLabel::Left, same_source, now),
            article(BiasLabel::Left, Uuid::new_v4(), now),
        ];
        let record = coverage_for_members(Uuid::new_v4(), &members, now);
        let missing = missing_buckets(&record);
        let (kind, severity) = blindspot_for_missing(&missing).unwrap();
        assert_eq!(kind, BlindspotKind::Underreported);
        assert_eq!(severity, Severity::High);
    }
}
