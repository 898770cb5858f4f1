//! CRM Backend
//!
//! A REST backend for a lightweight lead/customer CRM with SQLite
//! persistence: leads, customers, and follow-up tasks.

mod api;
mod config;
mod db;
mod errors;
mod models;

use std::sync::Arc;

use axum::{
    routing::{delete, get, patch, post, put},
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

    tracing::info!("Starting CRM Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    // Create application state
    let state = AppState { repo };

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

    // API routes
    let api_routes = Router::new()
        // Leads
        .route("/leads", get(api::list_leads))
        .route("/leads", post(api::create_lead))
        .route("/leads/{id}", get(api::get_lead))
        .route("/leads/{id}", put(api::update_lead))
        .route("/leads/{id}", delete(api::delete_lead))
        .route("/leads/{id}/status", patch(api::update_lead_status))
        .route("/leads/{id}/priority", patch(api::update_lead_priority))
        // Customers
        .route("/customers", get(api::list_customers))
        .route("/customers", post(api::create_customer))
        .route("/customers/{id}", get(api::get_customer))
        .route("/customers/{id}", put(api::update_customer))
        .route("/customers/{id}", delete(api::delete_customer))
        .route(
            "/customers/{id}/communication",
            post(api::add_communication_log),
        )
        .route("/customers/{id}/document", post(api::add_attached_document))
        .route("/customers/{id}/project", post(api::add_project_history))
        // Follow-up tasks
        .route("/followups", get(api::list_followups))
        .route("/followups", post(api::create_followup))
        .route("/followups/{id}", get(api::get_followup))
        .route("/followups/{id}", put(api::update_followup))
        .route("/followups/{id}", delete(api::delete_followup))
        .route("/followups/lead/{leadId}", get(api::list_followups_for_lead))
        .route(
            "/followups/customer/{customerId}",
            get(api::list_followups_for_customer),
        )
        // Integration stubs
        .route(
            "/integrations/import-leads-from-csv",
            post(api::import_leads_from_csv),
        )
        .route(
            "/integrations/google-ads/authenticate",
            post(api::google_ads_authenticate),
        )
        .route(
            "/integrations/google-ads/import-leads",
            post(api::google_ads_import_leads),
        )
        .route(
            "/integrations/meta-ads/authenticate",
            post(api::meta_ads_authenticate),
        )
        .route(
            "/integrations/meta-ads/import-leads",
            post(api::meta_ads_import_leads),
        )
        .route("/integrations/email/connect", post(api::email_connect));

    // Health check
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

#[cfg(test)]
mod tests;
