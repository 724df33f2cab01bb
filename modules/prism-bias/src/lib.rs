pub mod analyzer;
pub mod enricher;
pub mod error;

pub use analyzer::{AnalysisOutcome, BiasAnalyzer, MIN_INTERVAL_BATCH};
pub use enricher::ImmediateBiasEnricher;
pub use error::{BiasError, Result};
