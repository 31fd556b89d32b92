//! HackPortal
//!
//! Applicant portal for hackathon registration: a local HTTP surface over a
//! keyed query cache, a client store and route gates, backed by a SQLite
//! document store.

mod api;
mod auth;
mod cache;
mod config;
mod db;
mod errors;
mod forms;
mod gate;
mod models;
mod queries;
mod remote;
mod routes;
mod store;
mod util;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::Session;
use cache::QueryCache;
use config::Config;
use db::Repository;
use gate::Gate;
use queries::{DraftAutosave, QueryContext};
use remote::Backend;
use store::PortalStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub queries: QueryContext,
    pub config: Arc<Config>,
    pub autosave: Arc<DraftAutosave>,
}

impl AppState {
    /// Wire the hooks, store and autosave around a backend.
    pub fn new(backend: Arc<dyn Backend>, config: Config) -> Self {
        let queries = QueryContext::new(
            backend,
            QueryCache::new(config.cache_gc),
            Arc::new(Session::new()),
            Arc::new(PortalStore::new()),
            config.hackathon_year,
        );
        Self {
            queries,
            autosave: Arc::new(DraftAutosave::new(config.draft_autosave)),
            config: Arc::new(config),
        }
    }
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

    tracing::info!("Starting HackPortal {}", config::APP_VERSION);
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!(
        "Hackathon {} applications open {} to {}",
        config.hackathon_year,
        config.applications_open,
        config.applications_close
    );

    // Warn if PSK is not configured
    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (PORTAL_API_PSK). Authentication is disabled!");
    }

    // A bad window would silently close applications
    util::dates::parse_iso_date(&config.applications_open)?;
    util::dates::parse_iso_date(&config.applications_close)?;

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let backend: Arc<dyn Backend> = Arc::new(Repository::new(pool));

    // Create application state
    let state = AppState::new(backend, config.clone());
    let _gc = state.queries.cache.spawn_gc(config.cache_gc);

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Wrap `router` so every route in it is checked by `access` first.
fn gated(router: Router<AppState>, access: Gate, state: &AppState) -> Router<AppState> {
    let access = Arc::new(access);
    let state = state.clone();
    router.route_layer(middleware::from_fn(move |req, next| {
        gate::gate_layer(Arc::clone(&access), state.clone(), req, next)
    }))
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

    // Route-layers run outermost-last, so the sign-in gate is added last
    // and checked first.
    let apply_routes = Router::new()
        .route("/apply", get(api::get_apply))
        .route("/apply/draft", put(api::save_draft))
        .route("/apply/submit", post(api::submit_application));
    let apply_routes = gated(
        apply_routes,
        Gate::can_apply(&state.config.applications_open, &state.config.applications_close),
        &state,
    );
    let apply_routes = gated(apply_routes, Gate::signed_in(), &state);

    let status_routes = Router::new().route("/status", get(api::get_status));
    let status_routes = gated(status_routes, Gate::applicant(), &state);
    let status_routes = gated(status_routes, Gate::signed_in(), &state);

    let profile_routes = Router::new()
        .route("/profile", get(api::get_profile))
        .route("/profile/socials", put(api::update_socials))
        .route("/profile/picture", put(api::set_profile_picture))
        .route("/profile/emergency-contact", put(api::set_emergency_contact))
        .route("/profile/team", put(api::save_team))
        .route("/profile/verify-github", post(api::verify_github));
    let profile_routes = gated(profile_routes, Gate::signed_in(), &state);

    let admin_routes = Router::new()
        .route("/admin/scan/{id}", get(api::scan_application))
        .route(
            "/admin/applications/{id}/status",
            put(api::set_application_status),
        );
    let admin_routes = gated(admin_routes, Gate::admin(), &state);
    let admin_routes = gated(admin_routes, Gate::signed_in(), &state);

    // API routes
    let api_routes = Router::new()
        // Session
        .route(
            "/session",
            get(api::get_session)
                .post(api::sign_in)
                .delete(api::sign_out),
        )
        // Public pages
        .route("/", get(api::home))
        .route("/login", get(api::login))
        .merge(apply_routes)
        .merge(status_routes)
        .merge(profile_routes)
        .merge(admin_routes)
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
