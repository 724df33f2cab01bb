use std::sync::Arc;

use prism_common::Config;
use prism_embed::EmbeddingService;
use prism_llm::testing::FakeProvider;
use prism_llm::LlmClient;

fn test_config() -> Config {
    Config {
        database_url: String::new(),
        search_index_url: String::new(),
        search_index_key: String::new(),
        search_index_name: String::new(),
        local_provider_base_url: String::new(),
        local_generate_model: String::new(),
        local_embed_model: String::new(),
        remote_a_api_key: None,
        remote_a_model: String::new(),
        remote_b_api_key: None,
        remote_b_model: String::new(),
        api_host: String::new(),
        api_port: 0,
        ingest_interval_minutes: 30,
        dev_article_cap: -1,
        daily_budget_cents: 0,
    }
}

#[tokio::test]
async fn embeds_article_via_client() {
    let provider = Arc::new(FakeProvider::new().with_embed_response(vec![1.0, 0.0, 0.0]));
    let llm = LlmClient::with_provider(test_config(), provider);
    let service = EmbeddingService::new(&llm);

    let vector = service.embed_article("Title", "Summary").await;
    assert_eq!(vector, vec![1.0, 0.0, 0.0]);
}

#[tokio::test]
async fn returns_empty_vector_on_provider_failure() {
    // No embed responses queued: every call exhausts the fake provider's
    // script and errors, exercising the "never propagate, return empty
    // vector" path.
    let provider = Arc::new(FakeProvider::new());
    let llm = LlmClient::with_provider(test_config(), provider);
    let service = EmbeddingService::new(&llm);

    let vector = service.embed_article("Title", "Summary").await;
    assert!(vector.is_empty());
}

#[test]
fn cosine_similarity_via_service_matches_direct_call() {
    let provider: Arc<FakeProvider> = Arc::new(FakeProvider::new());
    let llm = LlmClient::with_provider(test_config(), provider);
    let service = EmbeddingService::new(&llm);
    assert_eq!(service.cosine(&[1.0, 0.0], &[1.0, 0.0]), 1.0);
}
