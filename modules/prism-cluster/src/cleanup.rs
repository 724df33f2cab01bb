use std::collections::HashMap;

use chrono::Duration;
use prism_common::{Article, Cluster, EnrichStats, MAX_CLUSTER_SIZE};
use prism_store::StoreGateway;
use uuid::Uuid;

use crate::error::Result;

/// Default cleanup time-window divisor: mega-clusters are split into
/// `h_hours / 2`-hour buckets.
pub const DEFAULT_H_HOURS: i64 = 24;

/// Sweep every cluster and repair duplicate-source membership, undersized
/// clusters, and mega-clusters. Returns counts of what was touched, used by
/// the scheduler's log line.
pub async fn cleanup(store: &StoreGateway, h_hours: i64) -> Result<EnrichStats> {
    let mut stats = EnrichStats::default();
    let clusters = store.list_all_clusters().await?;

    for cluster in clusters {
        let members = store.get_cluster_members(cluster.id).await?;

        let (kept, ungrouped) = dedupe_by_source(members);
        if !ungrouped.is_empty() {
            let ids: Vec<Uuid> = ungrouped.iter().map(|a| a.id).collect();
            store.ungroup_articles(&ids).await?;
            stats.articles_ungrouped += ids.len() as u64;
        }

        if kept.len() < 2 {
            let remaining: Vec<Uuid> = kept.iter().map(|a| a.id).collect();
            if !remaining.is_empty() {
                store.ungroup_articles(&remaining).await?;
            }
            store.dissolve_cluster(cluster.id).await?;
            stats.clusters_dissolved += 1;
            continue;
        }

        if kept.len() > MAX_CLUSTER_SIZE {
            split_mega_cluster(store, &cluster, kept, h_hours, &mut stats).await?;
        }
    }

    Ok(stats)
}

/// Duplicate-source repair: group members by source, keep the newest per source, return
/// `(kept, ungrouped)`.
fn dedupe_by_source(members: Vec<Article>) -> (Vec<Article>, Vec<Article>) {
    let mut by_source: HashMap<Uuid, Vec<Article>> = HashMap::new();
    for m in members {
        by_source.entry(m.source_id).or_default().push(m);
    }

    let mut kept = Vec::new();
    let mut ungrouped = Vec::new();
    for (_, mut group) in by_source {
        group.sort_by_key(|a| std::cmp::Reverse(a.published_at));
        kept.push(group.remove(0));
        ungrouped.extend(group);
    }
    kept.sort_by_key(|a| a.id);
    (kept, ungrouped)
}

async fn split_mega_cluster(
    store: &StoreGateway,
    cluster: &Cluster,
    members: Vec<Article>,
    h_hours: i64,
    stats: &mut EnrichStats,
) -> Result<()> {
    let window = Duration::hours((h_hours / 2).max(1));
    let mut sorted = members;
    sorted.sort_by_key(|a| a.published_at);

    let mut buckets: Vec<Vec<Article>> = Vec::new();
    let mut bucket_start = sorted.first().map(|a| a.published_at);
    let mut current = Vec::new();
    for article in sorted {
        match bucket_start {
            Some(start) if article.published_at < start + window => current.push(article),
            _ => {
                if !current.is_empty() {
                    buckets.push(std::mem::take(&mut current));
                }
                bucket_start = Some(article.published_at);
                current.push(article);
            }
        }
    }
    if !current.is_empty() {
        buckets.push(current);
    }

    let mut valid_buckets = Vec::new();
    let mut leftover: Vec<Uuid> = Vec::new();

    for bucket in buckets {
        let (mut kept, ungrouped) = dedupe_by_source(bucket);
        leftover.extend(ungrouped.into_iter().map(|a| a.id));
        kept.sort_by_key(|a| a.id);
        kept.truncate(MAX_CLUSTER_SIZE);
        if kept.len() < 2 {
            leftover.extend(kept.into_iter().map(|a| a.id));
            continue;
        }
        let master = kept[0].id;
        let display_name = kept[0].title.clone();
        let member_ids: Vec<Uuid> = kept.iter().map(|a| a.id).collect();
        valid_buckets.push((display_name, master, member_ids));
    }

    if valid_buckets.is_empty() {
        let all: Vec<Uuid> = leftover;
        if !all.is_empty() {
            store.ungroup_articles(&all).await?;
        }
        store.dissolve_cluster(cluster.id).await?;
        stats.clusters_dissolved += 1;
        return Ok(());
    }

    if !leftover.is_empty() {
        store.ungroup_articles(&leftover).await?;
    }
    let new_ids = store.split_cluster(cluster.id, valid_buckets).await?;
    stats.clusters_split += new_ids.len() as u64;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use prism_common::BiasLabel;

    fn article_at(id: Uuid, source: Uuid, minutes_ago: i64) -> Article {
        Article {
            id,
            source_id: source,
            cluster_id: None,
            title: "Title".to_string(),
            canonical_link: format!("https://example.com/{id}"),
            summary: Some("Summary".to_string()),
            published_at: Utc::now() - Duration::minutes(minutes_ago),
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
    fn dedupe_keeps_newest_per_source() {
        let source = Uuid::new_v4();
        let older = article_at(Uuid::new_v4(), source, 120);
        let newer = article_at(Uuid::new_v4(), source, 5);
        let (kept, ungrouped) = dedupe_by_source(vec![older.clone(), newer.clone()]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, newer.id);
        assert_eq!(ungrouped.len(), 1);
        assert_eq!(ungrouped[0].id, older.id);
    }

    #[test]
    fn dedupe_passes_through_distinct_sources() {
        let a = article_at(Uuid::new_v4(), Uuid::new_v4(), 10);
        let b = article_at(Uuid::new_v4(), Uuid::new_v4(), 20);
        let (kept, ungrouped) = dedupe_by_source(vec![a, b]);
        assert_eq!(kept.len(), 2);
        assert!(ungrouped.is_empty());
    }
}
