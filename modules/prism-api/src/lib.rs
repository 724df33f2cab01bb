use prism_store::StoreGateway;

pub mod handlers;

pub struct AppState {
    pub store: StoreGateway,
}

pub fn router(state: std::sync::Arc<AppState>) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/", get(handlers::health))
        .route("/api/clusters/trending", get(handlers::trending))
        .route("/api/clusters/{id}", get(handlers::cluster_detail))
        .route("/api/clusters/{id}/rate", post(handlers::rate_cluster))
        .route("/api/search", get(handlers::search))
        .route("/api/analytics/overview", get(handlers::analytics_overview))
        .route(
            "/api/analytics/bias-histogram",
            get(handlers::bias_histogram),
        )
        .route(
            "/api/users/{user_id}/blindspots",
            get(handlers::list_blindspots),
        )
        .route(
            "/api/blindspots/{id}/dismiss",
            post(handlers::dismiss_blindspot),
        )
        .with_state(state)
}
