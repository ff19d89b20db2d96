use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{
    db::Store,
    middleware::{make_span_with_request_id, request_id_middleware},
    services::{
        catalog::MovieCatalog, features::FeatureSpace, CompatibilityService, MatchReportService,
        RecommendationService, TasteVectorService, VotingSessionCoordinator,
    },
};

pub mod compatibility;
pub mod ratings;
pub mod recommendations;
pub mod taste_match;

/// Services shared by every handler
pub struct AppState {
    pub taste: TasteVectorService,
    pub reports: MatchReportService,
    pub sessions: VotingSessionCoordinator,
    pub compatibility: CompatibilityService,
    pub recommendations: RecommendationService,
    pub store: Arc<dyn Store>,
}

impl AppState {
    /// Wires the services over one store and one catalog. `lookup_timeout`
    /// bounds every catalog call made while scoring.
    pub fn new(
        store: Arc<dyn Store>,
        catalog: Arc<dyn MovieCatalog>,
        lookup_timeout: Duration,
    ) -> Self {
        let taste = TasteVectorService::new(store.clone(), catalog.clone(), lookup_timeout);
        let reports = MatchReportService::new(store.clone(), taste.clone());
        let sessions = VotingSessionCoordinator::new(store.clone(), taste.clone(), reports.clone());

        Self {
            compatibility: CompatibilityService::new(store.clone()),
            recommendations: RecommendationService::new(
                store.clone(),
                catalog,
                FeatureSpace::default(),
                lookup_timeout,
            ),
            taste,
            reports,
            sessions,
            store,
        }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ratings", post(ratings::record_rating))
        .route("/users/:user_id/watched", post(ratings::add_watched))
        .route("/users/:user_id/taste-vector", get(taste_match::taste_vector))
        .route(
            "/users/:user_id/curated-list",
            put(compatibility::save_curated_list).get(compatibility::get_curated_list),
        )
        .route(
            "/users/:user_id/recommendations/score",
            post(recommendations::score_candidates),
        )
        .route("/movies/similar", post(recommendations::similar_movies))
        .route(
            "/taste-match/:user_id/:friend_id",
            get(taste_match::taste_match),
        )
        .route(
            "/taste-match/:user_id/:friend_id/session",
            get(taste_match::session_state),
        )
        .route(
            "/compatibility/:user_id/:friend_id",
            get(compatibility::compatibility),
        )
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
