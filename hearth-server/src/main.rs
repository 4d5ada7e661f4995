//! hearth-server - family board and reminder service
//!
//! Serves the family calendar, tasks, notes, memories and announcements, and
//! sends WhatsApp/SMS reminders when the external scheduler calls the trigger
//! endpoints.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hearth_common::config::{RootFolderInitializer, TomlConfig};
use hearth_common::db::init_database;
use hearth_server::config::Args;
use hearth_server::db::sessions;
use hearth_server::services::quotes::{OpenAiQuoteProvider, QuotableQuoteProvider};
use hearth_server::services::{PhotoStore, QuoteProvider, QuoteService, TwilioGateway};
use hearth_server::{build_router, AppState, HearthConfig};

const DEFAULT_LOG_LEVEL: &str = "info";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // The log level may come from the TOML file, so read it under a temporary subscriber
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(DEFAULT_LOG_LEVEL))
        .finish();
    let toml = tracing::subscriber::with_default(bootstrap, || {
        TomlConfig::load_or_default(args.config.as_deref())
    });

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(toml.logging.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        "Starting hearth-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = HearthConfig::resolve(&args, &toml);
    info!("Root folder: {}", config.root_folder.display());
    info!("Credentials: {:?}", config.credentials);
    if config.trigger_auth.is_required() && config.credentials.cron_secret.is_none() {
        warn!(
            "require_cron_secret is set but CRON_SECRET is not configured; \
             trigger endpoints will refuse every call"
        );
    }

    let initializer = RootFolderInitializer::new(config.root_folder.clone());
    initializer
        .ensure_directory_exists()
        .context("Failed to create root folder")?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;
    info!("✓ Database ready");

    let purged = sessions::purge_expired_sessions(&pool, Utc::now()).await?;
    if purged > 0 {
        info!("Removed {} expired sessions", purged);
    }

    let gateway = TwilioGateway::new(&config.credentials)
        .context("Failed to create messaging gateway")?;

    let providers: Vec<Arc<dyn QuoteProvider>> = vec![
        Arc::new(
            OpenAiQuoteProvider::new(
                config.credentials.openai_api_key.clone(),
                config.openai_model.clone(),
            )
            .context("Failed to create OpenAI quote provider")?,
        ),
        Arc::new(QuotableQuoteProvider::new().context("Failed to create Quotable quote provider")?),
    ];

    let photos = PhotoStore::new(initializer.photos_path());
    let bind_address = config.bind_address.clone();

    let state = AppState::new(
        pool,
        Arc::new(gateway),
        Arc::new(QuoteService::new(providers)),
        photos,
        config,
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!("Listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
