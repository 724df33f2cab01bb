pub mod assembly;
pub mod cascade;
pub mod cleanup;
pub mod engine;
pub mod error;

pub use cascade::{CascadeThresholds, FallbackSimilarity};
pub use cleanup::cleanup;
pub use engine::{BatchLimits, ClusterEnricher, ClusteringEngine, NullEnricher};
pub use error::{ClusterError, Result};
