//! Colloquy server entry point.

use std::sync::Arc;

use colloquy_api::{AppState, app};
use colloquy_common::Config;
use colloquy_core::InteractionService;
use colloquy_db::repositories::{CommentRepository, ReactionRepository};
use colloquy_db::store::{CommentStore, MemoryStore, ReactionStore};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Pick the storage backend from configuration.
async fn open_stores(config: &Config) -> anyhow::Result<(CommentStore, ReactionStore)> {
    let Some(database) = &config.database else {
        warn!("No database configured, comments and reactions are kept in memory");
        return Ok((
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
        ));
    };

    let db = colloquy_db::init(database).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    colloquy_db::migrate(&db).await?;
    info!("Migrations completed");

    let db = Arc::new(db);
    Ok((
        Arc::new(CommentRepository::new(Arc::clone(&db))),
        Arc::new(ReactionRepository::new(db)),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "colloquy=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting colloquy server...");

    let config = Config::load()?;

    let (comment_store, reaction_store) = open_stores(&config).await?;
    let interaction_service =
        InteractionService::from_config(comment_store, reaction_store, &config);

    let router = app(AppState::new(interaction_service))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
