use axum::{
    http::HeaderValue,
    middleware as axum_mw,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;

use config::Config;
use services::cashfree::CashfreeClient;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
    pub cashfree: Option<CashfreeClient>,
}

fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.cors_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let admin = axum_mw::from_fn_with_state(state.clone(), middleware::admin::require_admin);

    // Public routes let players RSVP and pay without credentials; admin
    // routes carry the shared-secret layer on their method router.
    Router::new()
        .route(
            "/sessions",
            post(routes::sessions::create_session).layer(admin.clone()),
        )
        .route("/sessions/current", get(routes::sessions::get_current))
        .route("/sessions/:session_id", get(routes::sessions::get_session))
        .route(
            "/sessions/:session_id",
            delete(routes::sessions::delete_session).layer(admin.clone()),
        )
        .route(
            "/sessions/:session_id/lock",
            post(routes::sessions::lock_session).layer(admin.clone()),
        )
        .route(
            "/sessions/:session_id/close",
            post(routes::sessions::close_session).layer(admin.clone()),
        )
        .route(
            "/sessions/:session_id/rsvp",
            post(routes::sessions::add_rsvp),
        )
        .route(
            "/sessions/:session_id/rsvps/:rsvp_id/cash",
            patch(routes::sessions::mark_cash).layer(admin.clone()),
        )
        .route(
            "/sessions/:session_id/rsvps/:rsvp_id",
            delete(routes::sessions::remove_rsvp).layer(admin),
        )
        .route(
            "/sessions/:session_id/pay/create",
            post(routes::payments::create_payment),
        )
        .route(
            "/sessions/:session_id/pay/verify",
            post(routes::payments::verify_payment),
        )
        .route("/health", get(routes::health::health))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let pool = db::create_pool(&config).await;
    db::init_schema(&pool)
        .await
        .expect("Failed to initialize database schema");

    let cashfree = CashfreeClient::new(&config.cashfree);
    if cashfree.is_none() {
        tracing::warn!("Cashfree credentials missing, online payments disabled");
    }

    let port = config.port;
    let state = AppState {
        db: pool,
        config: Arc::new(config),
        cashfree,
    };

    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .expect("Failed to bind port");

    tracing::info!(port, "Turf Split API listening");
    axum::serve(listener, router)
        .await
        .expect("Server error");
}
