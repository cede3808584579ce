//! Agora Server - Main Entry Point

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use agora_server::{api, config, db, permissions};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agora_server=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        grant_policy = ?config.grant_policy,
        "Starting Agora Server"
    );

    // Initialize storage
    let store: Arc<dyn db::Store> = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url).await?;
            db::run_migrations(&pool).await?;
            Arc::new(db::PgStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set; data is kept in memory and lost on restart");
            Arc::new(db::MemoryStore::new())
        }
    };

    let roles = permissions::ensure_builtin_roles(store.as_ref()).await?;
    info!(
        admin_role = %roles.admin.id,
        moderator_role = %roles.moderator.id,
        "Built-in roles ready"
    );

    // Build application state
    let state = api::AppState::new(store, config.clone());

    // Build router
    let app = api::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!(address = %config.bind_address, "Server listening");

    // Graceful shutdown handler
    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        info!("Received shutdown signal, cleaning up...");
    };

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal)
    .await?;

    info!("Server shutdown complete");

    Ok(())
}
