// Route definitions. The paths here mirror the route table in nav.rs; the
// table is the single source of truth for link building, this router is its
// axum-side counterpart.

use axum::{
    Router,
    routing::{any, get},
};

use crate::AppState;
use crate::proxy;

mod api;
mod pages;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        // Server-rendered pages
        .route("/", get(pages::landing_page))
        .route("/catalog", get(pages::catalog_index))
        .route("/catalog/:brand", get(pages::catalog_brand))
        .route("/catalog/:brand/:model", get(pages::catalog_model))
        .route("/catalog/:brand/:model/:vehicle_id", get(pages::vehicle_page))
        .route("/v/:vehicle_id", get(pages::vehicle_short_page))
        // Own JSON endpoints
        .route("/health", get(api::health))
        // Upstream passthrough; /apix gets the API key injected server-side
        .route("/media/*path", any(proxy::forward))
        .route("/apix/*path", any(proxy::forward))
        .fallback(pages::not_found)
        .with_state(app_state)
}
