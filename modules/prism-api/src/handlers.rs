use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use prism_common::RatingValue;

use crate::AppState;

// --- Query structs ---

#[derive(Deserialize)]
pub struct TrendingQuery {
    since_hours: Option<i64>,
    min_coverage: Option<f64>,
    offset: Option<i64>,
    limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    q: String,
    since_hours: Option<i64>,
    min_coverage: Option<f64>,
    offset: Option<i64>,
    limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct RatingBody {
    user_id: Uuid,
    value: RatingValue,
}

fn parse_uuid(id: &str) -> Result<Uuid, StatusCode> {
    Uuid::parse_str(id).map_err(|_| StatusCode::BAD_REQUEST)
}

// --- Handlers ---

pub async fn trending(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TrendingQuery>,
) -> impl IntoResponse {
    let since = Utc::now() - Duration::hours(params.since_hours.unwrap_or(48).max(1));
    let min_coverage = params.min_coverage.unwrap_or(0.0);
    let offset = params.offset.unwrap_or(0).max(0);
    let limit = params.limit.unwrap_or(20).clamp(1, 100);

    match state
        .store
        .list_trending_clusters(since, min_coverage, offset, limit)
        .await
    {
        Ok(rows) => {
            let items: Vec<serde_json::Value> = rows
                .into_iter()
                .map(|(cluster, coverage)| {
                    serde_json::json!({ "cluster": cluster, "coverage": coverage })
                })
                .collect();
            Json(serde_json::json!({ "clusters": items })).into_response()
        }
        Err(e) => {
            warn!(error = %e, "failed to load trending clusters");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn cluster_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let cluster_id = match parse_uuid(&id) {
        Ok(u) => u,
        Err(status) => return status.into_response(),
    };

    let cluster = match state.store.get_cluster(cluster_id).await {
        Ok(Some(c)) => c,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            warn!(error = %e, "failed to load cluster");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let members = match state.store.get_cluster_members(cluster_id).await {
        Ok(m) => m,
        Err(e) => {
            warn!(error = %e, "failed to load cluster members");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let coverage = match state.store.get_coverage(cluster_id).await {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "failed to load cluster coverage");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    Json(serde_json::json!({
        "cluster": cluster,
        "articles": members,
        "coverage": coverage,
    }))
    .into_response()
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> impl IntoResponse {
    if params.q.trim().is_empty() {
        return StatusCode::BAD_REQUEST.into_response();
    }
    let since = Utc::now() - Duration::hours(params.since_hours.unwrap_or(24 * 30).max(1));
    let min_coverage = params.min_coverage.unwrap_or(0.0);
    let offset = params.offset.unwrap_or(0).max(0);
    let limit = params.limit.unwrap_or(20).clamp(1, 100);

    match state
        .store
        .search_articles(&params.q, since, min_coverage, offset, limit)
        .await
    {
        Ok(articles) => Json(serde_json::json!({ "articles": articles })).into_response(),
        Err(e) => {
            warn!(error = %e, "failed to search articles");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn analytics_overview(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.analytics_overview().await {
        Ok(overview) => Json(overview).into_response(),
        Err(e) => {
            warn!(error = %e, "failed to load analytics overview");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn bias_histogram(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.bias_histogram().await {
        Ok(buckets) => Json(serde_json::json!({ "buckets": buckets })).into_response(),
        Err(e) => {
            warn!(error = %e, "failed to compute bias histogram");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn list_blindspots(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let user_id = match parse_uuid(&user_id) {
        Ok(u) => u,
        Err(status) => return status.into_response(),
    };

    match state.store.list_blindspots_for_user(user_id).await {
        Ok(blindspots) => Json(serde_json::json!({ "blindspots": blindspots })).into_response(),
        Err(e) => {
            warn!(error = %e, "failed to load blindspots");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn dismiss_blindspot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let id = match parse_uuid(&id) {
        Ok(u) => u,
        Err(status) => return status.into_response(),
    };

    match state.store.dismiss_blindspot(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            warn!(error = %e, "failed to dismiss blindspot");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn rate_cluster(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<RatingBody>,
) -> impl IntoResponse {
    let cluster_id = match parse_uuid(&id) {
        Ok(u) => u,
        Err(status) => return status.into_response(),
    };

    match state
        .store
        .upsert_rating(body.user_id, cluster_id, body.value)
        .await
    {
        Ok(rating_id) => Json(serde_json::json!({ "id": rating_id })).into_response(),
        Err(e) => {
            warn!(error = %e, "failed to record rating");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn health() -> impl IntoResponse {
    "ok"
}
