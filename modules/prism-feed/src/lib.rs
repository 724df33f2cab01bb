pub mod discovery;
pub mod error;
pub mod fetch;

pub use discovery::discover_feed_urls;
pub use error::{FeedError, Result};
pub use fetch::FeedReader;
