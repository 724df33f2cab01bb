//! Integration tests for the Read API's handlers, exercised against an
//! in-process axum app. Requires a Postgres instance; set DATABASE_TEST_URL
//! or these tests are skipped.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Utc;
use prism_api::AppState;
use prism_common::BiasLabel;
use prism_store::{NewArticle, StoreGateway};
use sqlx::PgPool;
use tower::ServiceExt;

async fn test_gateway() -> Option<StoreGateway> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;
    let gateway = StoreGateway::new(pool);
    gateway.migrate().await.ok()?;
    Some(gateway)
}

fn test_app(store: StoreGateway) -> axum::Router {
    prism_api::router(Arc::new(AppState { store }))
}

#[tokio::test]
async fn health_check_returns_ok() {
    let Some(store) = test_gateway().await else {
        return;
    };
    let app = test_app(store);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn cluster_detail_rejects_malformed_id() {
    let Some(store) = test_gateway().await else {
        return;
    };
    let app = test_app(store);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/clusters/not-a-uuid")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cluster_detail_404s_for_unknown_cluster() {
    let Some(store) = test_gateway().await else {
        return;
    };
    let app = test_app(store);

    let missing = uuid::Uuid::new_v4();
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/clusters/{missing}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn search_requires_a_non_empty_query() {
    let Some(store) = test_gateway().await else {
        return;
    };
    let app = test_app(store);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/search?q=")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn trending_excludes_clusters_below_min_coverage() {
    let Some(store) = test_gateway().await else {
        return;
    };

    let left = store
        .upsert_source(
            "API Test Left",
            "https://api-left.example",
            "https://api-left.example/feed",
            BiasLabel::Left,
        )
        .await
        .unwrap();
    let right = store
        .upsert_source(
            "API Test Right",
            "https://api-right.example",
            "https://api-right.example/feed",
            BiasLabel::Right,
        )
        .await
        .unwrap();

    let a = store
        .insert_article_if_new(
            NewArticle {
                source_id: left,
                title: "A trending story with enough length".to_string(),
                canonical_link: "https://api-left.example/story-1".to_string(),
                summary: Some("Summary text.".to_string()),
                published_at: Utc::now(),
                image_url: None,
                bias: BiasLabel::Left,
            },
            Utc::now(),
        )
        .await
        .unwrap()
        .unwrap();
    let b = store
        .insert_article_if_new(
            NewArticle {
                source_id: right,
                title: "The same trending story, other side".to_string(),
                canonical_link: "https://api-right.example/story-1".to_string(),
                summary: Some("Summary text.".to_string()),
                published_at: Utc::now(),
                image_url: None,
                bias: BiasLabel::Right,
            },
            Utc::now(),
        )
        .await
        .unwrap()
        .unwrap();

    let cluster_id = store
        .create_cluster("A trending story", a.id, &[a.id, b.id])
        .await
        .unwrap();

    store
        .upsert_coverage(&prism_common::CoverageRecord {
            cluster_id,
            left_count: 1,
            center_count: 0,
            right_count: 1,
            total: 2,
            coverage_score: 80.0,
            first_reported: Utc::now(),
            last_updated: Utc::now(),
        })
        .await
        .unwrap();

    let app = test_app(store);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/clusters/trending?min_coverage=90")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(value["clusters"].as_array().unwrap().is_empty());
}
