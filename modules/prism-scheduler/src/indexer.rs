use std::collections::HashMap;

use prism_store::{ArticleDocument, SearchIndex, StoreGateway};
use uuid::Uuid;

use crate::error::Result;

/// Push every bias-analyzed, not-yet-indexed article to the full-text index
/// and flip its `indexed` flag on success. A per-article failure is logged
/// and skipped; the article is retried on the next sweep (§6: the flag only
/// flips after a successful acknowledgement).
pub async fn index_pending(store: &StoreGateway, index: &dyn SearchIndex) -> Result<u64> {
    let pending = store.list_articles_pending_index().await?;
    if pending.is_empty() {
        return Ok(0);
    }

    let sources = store.list_sources().await?;
    let source_names: HashMap<Uuid, String> =
        sources.into_iter().map(|s| (s.id, s.name)).collect();

    let mut indexed = 0u64;
    for article in pending {
        let source_name = source_names
            .get(&article.source_id)
            .cloned()
            .unwrap_or_default();
        let doc = ArticleDocument::from_article(&article, &source_name);
        match index.upsert(doc).await {
            Ok(()) => {
                store.mark_article_indexed(article.id).await?;
                indexed += 1;
            }
            Err(err) => {
                tracing::warn!(%err, article_id = %article.id, "index upsert failed, will retry next sweep");
            }
        }
    }
    Ok(indexed)
}
