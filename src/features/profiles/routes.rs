use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::profiles::handlers;
use crate::features::profiles::services::ProfileService;

/// Routes for the caller's own profile (behind auth)
pub fn routes(service: Arc<ProfileService>) -> Router {
    Router::new()
        .route(
            "/api/profiles/me",
            get(handlers::get_my_profile).put(handlers::upsert_my_profile),
        )
        .route("/api/profiles/me/skills", get(handlers::get_my_skills))
        .route("/api/profiles/me/portfolio", get(handlers::get_my_portfolio))
        .with_state(service)
}

/// Public portfolio routes (no auth)
pub fn public_routes(service: Arc<ProfileService>) -> Router {
    Router::new()
        .route(
            "/api/profiles/{user_id}/public",
            get(handlers::get_public_profile),
        )
        .with_state(service)
}
