mod error;
mod index;
mod rows;
mod store;

pub use error::{Result, StoreError};
pub use index::{ArticleDocument, NullIndex, SearchIndex, TypesenseIndex};
pub use store::{ArticleBiasUpdate, BiasWriteBack, NewArticle, StoreGateway, StoreTx};
