use std::collections::{HashMap, HashSet};

use prism_common::{Article, MAX_CLUSTER_SIZE};
use uuid::Uuid;

use crate::cascade::SurvivorGraph;

/// A provisional cluster ready to persist: at least 2 members, master is
/// the lowest-id (first-processed) article.
#[derive(Debug, Clone)]
pub struct ClusterFormation {
    pub master_id: Uuid,
    pub member_ids: Vec<Uuid>,
}

/// Iterative (non-recursive) DFS over the survivor graph, collecting the
/// full connected component reachable from `start`. Recursion is avoided
/// per the cluster-assembly design note — a large sparse component must
/// not blow the stack before size limits get a chance to apply.
fn connected_component(start: Uuid, graph: &SurvivorGraph, visited: &mut HashSet<Uuid>) -> Vec<Uuid> {
    let mut component = Vec::new();
    let mut stack = vec![start];
    visited.insert(start);

    while let Some(node) = stack.pop() {
        component.push(node);
        if let Some(neighbors) = graph.get(&node) {
            for &next in neighbors {
                if visited.insert(next) {
                    stack.push(next);
                }
            }
        }
    }
    component.sort();
    component
}

/// Greedy cluster assembly per §4.5 "Cluster assembly" and the §9 design
/// note on graph traversal: find each unclustered article's connected
/// component via iterative DFS, then greedily walk that component in
/// ascending id order, adding a member iff it's unclustered, doesn't share
/// a source already in the provisional cluster, and doesn't exceed
/// the size bound. Singletons are discarded, not persisted.
pub fn assemble_clusters(articles: &[Article], graph: &SurvivorGraph) -> Vec<ClusterFormation> {
    let source_of: HashMap<Uuid, Uuid> = articles.iter().map(|a| (a.id, a.source_id)).collect();

    let mut ids: Vec<Uuid> = articles.iter().map(|a| a.id).collect();
    ids.sort();

    let mut visited: HashSet<Uuid> = HashSet::new();
    let mut already_clustered: HashSet<Uuid> = HashSet::new();
    let mut formations = Vec::new();

    for a_id in &ids {
        if visited.contains(a_id) || already_clustered.contains(a_id) {
            continue;
        }
        if !graph.contains_key(a_id) {
            visited.insert(*a_id);
            continue;
        }

        let component = connected_component(*a_id, graph, &mut visited);

        let mut member_ids = vec![*a_id];
        let mut sources_used: HashSet<Uuid> = HashSet::new();
        if let Some(src) = source_of.get(a_id) {
            sources_used.insert(*src);
        }

        for candidate_id in component {
            if candidate_id == *a_id {
                continue;
            }
            if already_clustered.contains(&candidate_id) {
                continue;
            }
            let Some(candidate_source) = source_of.get(&candidate_id) else {
                continue;
            };
            if sources_used.contains(candidate_source) {
                continue;
            }
            if member_ids.len() >= MAX_CLUSTER_SIZE {
                break;
            }
            member_ids.push(candidate_id);
            sources_used.insert(*candidate_source);
        }

        if member_ids.len() >= 2 {
            for id in &member_ids {
                already_clustered.insert(*id);
            }
            formations.push(ClusterFormation {
                master_id: *a_id,
                member_ids,
            });
        }
    }

    formations
}
