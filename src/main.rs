use std::net::SocketAddr;
use std::sync::Arc;

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use boxoffice_server::auth::{
    AccessGate, InMemoryLoginThrottle, OrganiserCredential, SessionStore, ThrottlePolicy,
};
use boxoffice_server::config::Config;
use boxoffice_server::ledger::PgLedger;
use boxoffice_server::routes::create_routes;
use boxoffice_server::services::SystemClock;
use boxoffice_server::state::AppState;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env().expect("Invalid configuration");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Successfully connected to database");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    tracing::info!("Migrations run successfully");

    let gate = AccessGate::new(
        OrganiserCredential::new(config.organiser_password.as_str()),
        Arc::new(InMemoryLoginThrottle::new(ThrottlePolicy::default())),
        Arc::new(SessionStore::default()),
    );
    let state = AppState::new(
        Arc::new(PgLedger::new(pool)),
        Arc::new(SystemClock),
        gate,
        config.environment,
    );
    let app = create_routes(state, &config.cors_allowed_origins);

    let addr = config.bind_addr();
    tracing::info!(environment = ?config.environment, "Server running at http://{}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .expect("Server failed");
}
