//! CafeHub Backend
//!
//! A production-grade REST backend for cafe discovery and live occupancy
//! tracking, with SQLite persistence.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod occupancy;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting CafeHub Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if PSK is not configured
    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (CAFEHUB_API_PSK). Authentication is disabled!");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    // Create application state
    let state = AppState {
        repo,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
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

    // API routes
    let api_routes = Router::new()
        // Cafes
        .route("/cafes", get(api::list_cafes))
        .route("/cafes", post(api::create_cafe))
        .route("/cafes/{cafe_id}", get(api::get_cafe))
        .route("/cafes/{cafe_id}", patch(api::update_cafe))
        .route("/cafes/{cafe_id}", delete(api::delete_cafe))
        // Occupancy
        .route("/occupancy", post(api::record_occupancy))
        .route(
            "/occupancy/history/{cafe_id}",
            get(api::get_occupancy_history),
        )
        // Users
        .route("/users", get(api::list_users))
        .route("/users", post(api::create_user))
        .route("/users/{subject}", get(api::get_user))
        .route("/users/{subject}", patch(api::update_user))
        // Check-ins
        .route("/checkins", post(api::create_checkin))
        .route("/checkins/status", get(api::get_checkin_status))
        .route("/checkins/today", get(api::get_today_checkins))
        // Reviews
        .route("/reviews", post(api::create_review))
        .route("/reviews/cafe/{cafe_id}", get(api::get_cafe_reviews))
        // Reservations
        .route("/reservations", post(api::create_reservation))
        .route(
            "/reservations/user/{subject}",
            get(api::get_user_reservations),
        )
        .route(
            "/reservations/cafe/{cafe_id}",
            get(api::get_cafe_reservations),
        )
        .route("/reservations/{id}", patch(api::update_reservation))
        .route("/reservations/{id}", delete(api::delete_reservation))
        // Live updates
        .route("/liveUpdates", post(api::create_live_update))
        .route("/liveUpdates/cafe/{cafe_id}", get(api::get_cafe_live_updates))
        .route("/liveUpdates/user/{subject}", get(api::get_user_live_updates))
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .merge(api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
