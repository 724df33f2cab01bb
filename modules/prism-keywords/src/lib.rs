pub mod entities;
pub mod extract;
pub mod score;
pub mod topics;

pub use extract::{extract, KeywordBag};
pub use score::{composite_score, entity_score, jaccard};

/// Default semantic-preprocessing threshold (`τ_sem`). Candidates below
/// this composite score are dropped before the embedding stage even runs.
pub const DEFAULT_TAU_SEM: f64 = 0.3;

/// Number of top candidates kept per article after semantic preprocessing.
pub const TOP_M_CANDIDATES: usize = 10;
