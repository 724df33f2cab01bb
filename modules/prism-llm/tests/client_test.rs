use std::sync::Arc;

use prism_common::Config;
use prism_llm::client::LlmClient;
use prism_llm::testing::FakeProvider;
use prism_llm::types::BiasAnalysisArticle;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

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
async fn analyzes_bias_from_scripted_response() {
    let article_a = Uuid::new_v4();
    let article_b = Uuid::new_v4();
    let response = format!(
        r#"```json
        {{
            "mostUnbiasedArticleId": "{article_a}",
            "neutralSummary": "Both outlets report the same facts.",
            "articles": [
                {{"articleId": "{article_a}", "biasScore": 2, "leftBias": 1, "rightBias": 0, "sensationalism": 1, "reasoning": "measured tone"}},
                {{"articleId": "{article_b}", "biasScore": 7, "leftBias": 0, "rightBias": 6, "sensationalism": 8, "reasoning": "inflammatory headline"}}
            ]
        }}
        ```"#
    );
    let provider = Arc::new(FakeProvider::new().with_generate_response(response));
    let client = LlmClient::with_provider(test_config(), provider);

    let articles = vec![
        BiasAnalysisArticle {
            article_id: article_a,
            source_name: "Outlet A".to_string(),
            title: "Title A".to_string(),
            summary: "Summary A".to_string(),
        },
        BiasAnalysisArticle {
            article_id: article_b,
            source_name: "Outlet B".to_string(),
            title: "Title B".to_string(),
            summary: "Summary B".to_string(),
        },
    ];

    let result = client.analyze_bias(&articles).await.unwrap();
    assert_eq!(result.most_unbiased_article_id, article_a);
    assert_eq!(result.articles.len(), 2);
    let bias_b = result
        .articles
        .iter()
        .find(|a| a.article_id == article_b)
        .unwrap();
    assert_eq!(bias_b.bias_score, 7.0);
    assert_eq!(bias_b.sensationalism, 8.0);
}

#[tokio::test]
async fn judges_similarity_from_scripted_response() {
    let provider = Arc::new(FakeProvider::new().with_generate_response(
        r#"{"similarity": 0.92, "isMatch": true, "reasoning": "same event, same quotes"}"#,
    ));
    let client = LlmClient::with_provider(test_config(), provider);

    let judgment = client
        .judge_similarity("Storm hits coast", "details...", "Coastal storm", "more details...")
        .await
        .unwrap();

    assert!(judgment.is_match);
    assert!((judgment.similarity - 0.92).abs() < f64::EPSILON);
}

#[tokio::test]
async fn embed_routes_to_the_local_provider_even_when_a_remote_provider_is_configured() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "embedding": [0.1, 0.2, 0.3]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = test_config();
    config.local_provider_base_url = mock_server.uri();
    config.local_embed_model = "nomic-embed-text".to_string();
    // A remote credential is present, so generation would select remote_a;
    // embed() must still bypass it and hit the mocked local endpoint above.
    config.remote_a_api_key = Some("fake-remote-a-key".to_string());
    config.remote_a_model = "gpt-test".to_string();

    let client = LlmClient::new(config);
    let vector = client.embed("breaking news").await.unwrap();

    assert_eq!(vector, vec![0.1, 0.2, 0.3]);
}

#[tokio::test]
async fn exhausts_retries_on_repeated_failure() {
    let provider = Arc::new(
        FakeProvider::new()
            .with_generate_error(prism_llm::LlmError::ProviderRateLimited)
            .with_generate_error(prism_llm::LlmError::ProviderRateLimited)
            .with_generate_error(prism_llm::LlmError::ProviderRateLimited),
    );
    let client = LlmClient::with_provider(test_config(), provider);

    let err = client
        .judge_similarity("a", "b", "c", "d")
        .await
        .unwrap_err();
    assert!(matches!(err, prism_llm::LlmError::ProviderRateLimited));
}
