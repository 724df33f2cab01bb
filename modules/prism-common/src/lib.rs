pub mod config;
pub mod error;
pub mod stats;
pub mod types;

pub use config::Config;
pub use error::{PrismError, Result};
pub use stats::{EnrichStats, IngestStats};
pub use types::*;
