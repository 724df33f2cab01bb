use serde::{Deserialize, Serialize};

/// Per-run Feed Reader counters, returned by every ingest entry point and
/// logged at `info`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct IngestStats {
    pub fetched: u64,
    pub inserted: u64,
    pub skipped_duplicate: u64,
    pub skipped_invalid: u64,
}

impl std::ops::AddAssign for IngestStats {
    fn add_assign(&mut self, other: Self) {
        self.fetched += other.fetched;
        self.inserted += other.inserted;
        self.skipped_duplicate += other.skipped_duplicate;
        self.skipped_invalid += other.skipped_invalid;
    }
}

/// Per-run Clustering Engine + Bias Analyzer counters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EnrichStats {
    pub clusters_created: u64,
    pub clusters_updated: u64,
    pub clusters_dissolved: u64,
    pub clusters_split: u64,
    pub articles_attached: u64,
    pub articles_ungrouped: u64,
    pub clusters_analyzed: u64,
    pub analyses_failed: u64,
}

impl std::ops::AddAssign for EnrichStats {
    fn add_assign(&mut self, other: Self) {
        self.clusters_created += other.clusters_created;
        self.clusters_updated += other.clusters_updated;
        self.clusters_dissolved += other.clusters_dissolved;
        self.clusters_split += other.clusters_split;
        self.articles_attached += other.articles_attached;
        self.articles_ungrouped += other.articles_ungrouped;
        self.clusters_analyzed += other.clusters_analyzed;
        self.analyses_failed += other.analyses_failed;
    }
}
