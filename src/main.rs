//! Service entrypoint: configuration, logging, database pool, HTTP server.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use circles::adapters::http::{circles_router, CirclesAppState};
use circles::adapters::postgres::{
    PostgresCircleDirectory, PostgresInvitationLedger, PostgresInvitationStore,
    PostgresMembershipStore,
};
use circles::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let state = CirclesAppState::new(
        Arc::new(PostgresCircleDirectory::new(pool.clone())),
        Arc::new(PostgresMembershipStore::new(pool.clone())),
        Arc::new(PostgresInvitationStore::new(pool.clone())),
        Arc::new(PostgresInvitationLedger::new(
            pool.clone(),
            config.invitations.default_remaining_invitations,
        )),
    );

    let app = Router::new()
        .merge(circles_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(config.server.request_timeout()))
                .layer(cors_layer(&config)),
        )
        .with_state(state);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Serving circles at http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
