mod config;
mod db;
mod error;
mod format;
mod listing;
mod routes;
mod services;
mod state;
mod validate;

use std::sync::Arc;

use services::auth::{HttpIdentityProvider, IdentityProvider};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let config = config::AppConfig::from_env();

    let pool = db::init_pool(&database_url)
        .await
        .expect("database init failed");

    // Provider sign-in is optional; password sign-in works without it.
    let identity: Option<Arc<dyn IdentityProvider>> = match HttpIdentityProvider::from_env() {
        Some(provider) => {
            tracing::info!(url = %provider.user_url(), "identity provider configured");
            Some(Arc::new(provider))
        }
        None => {
            tracing::warn!("AUTH_PROVIDER_URL not set, provider sign-in disabled");
            None
        }
    };

    services::session::spawn_session_sweeper(
        pool.clone(),
        std::time::Duration::from_secs(config.session_sweep_minutes * 60),
    );

    let port = config.port;
    let state = state::AppState::new(pool, config, identity);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "gestao listening");
    axum::serve(listener, app).await.expect("server failed");
}
