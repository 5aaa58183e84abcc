//! Squad roster tracker.
//!
//! An HTTP document service holding one roster document in SQLite, plus the
//! client side that edits it: a sync adapter with a local cache fallback, the
//! session, the edit controller and the table view.

pub mod api;
pub mod auth;
pub mod color;
pub mod config;
pub mod controller;
pub mod db;
pub mod edit;
pub mod errors;
pub mod models;
pub mod notice;
pub mod session;
pub mod sync;
pub mod totals;
pub mod view;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use db::Repository;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Arc<Config>,
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    let api_routes = Router::new()
        .route("/roster", get(api::get_roster).put(api::put_roster))
        .route("/roster/revision", get(api::get_revision))
        .route("/roster/totals", get(api::get_totals))
        .route("/roster/view", get(api::get_view))
        .route("/session", get(api::get_session))
        // Writes need the PSK; reads pass through
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
