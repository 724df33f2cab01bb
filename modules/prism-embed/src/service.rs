use prism_llm::LlmClient;

use crate::similarity::cosine_similarity;

/// Thin wrapper around the LLM client's embedding call. Maps `title + " " +
/// summary` to a fixed-dimension vector and exposes cosine similarity over
/// the results.
pub struct EmbeddingService<'a> {
    llm: &'a LlmClient,
}

impl<'a> EmbeddingService<'a> {
    pub fn new(llm: &'a LlmClient) -> Self {
        Self { llm }
    }

    /// Embed a title+summary pair. On any provider failure, logs and
    /// returns the empty vector — callers treat an empty vector as "no
    /// signal" rather than propagating the error.
    pub async fn embed_article(&self, title: &str, summary: &str) -> Vec<f32> {
        let text = format!("{title} {summary}");
        match self.llm.embed(&text).await {
            Ok(vector) => vector,
            Err(err) => {
                tracing::warn!(%err, "embedding call failed, returning empty vector");
                Vec::new()
            }
        }
    }

    pub fn cosine(&self, a: &[f32], b: &[f32]) -> f64 {
        cosine_similarity(a, b)
    }
}
