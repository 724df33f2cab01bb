pub mod enricher;
pub mod error;
pub mod indexer;
pub mod pipeline;
pub mod scheduler;

pub use enricher::CompositeEnricher;
pub use error::{Result, SchedulerError};
pub use indexer::index_pending;
pub use pipeline::Pipeline;
pub use scheduler::Scheduler;
