// VamCar: server-rendered car catalog over the Carapis Encar API.
//
// The web layer (routes, templates, proxy) renders one page per request.
// The interactive core (NavState, FilterSync, CatalogProvider) is the same
// state machinery exposed as embeddable components: navigation query in a
// watch channel, filter commits layered on top, catalog fetches driven by
// query changes.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::FromRef;
use reqwest::Client;

pub mod catalog;
pub mod config;
pub mod encar_api;
pub mod error;
pub mod filters;
pub mod models;
pub mod nav;
pub mod proxy;
pub mod routes;
pub mod sync;

use crate::config::Settings;
use crate::encar_api::EncarClient;

// Shared per-process state, built once in main and cloned into handlers.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub http_client: Arc<Client>,
    pub api: Arc<EncarClient>,
    pub started_at: Instant,
}
