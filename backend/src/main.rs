//! Fitness Coach Backend
//!
//! Reminder scheduling and completion tracking for a chat-based fitness coach.
//!
//! ## Architecture
//!
//! - Routes: HTTP API, health checks and the Telegram webhook
//! - Services: schedule generation, reminder delivery, completion tracking
//! - Store: PostgreSQL with SQLx
//! - Dispatcher: background task delivering due reminders

use anyhow::Result;
use fitness_coach_backend::{
    config, db,
    generator::{ContentGenerator, DisabledGenerator, OllamaGenerator},
    routes,
    services::ReminderDispatcher,
    state::AppState,
    store::PgStore,
    transport::TelegramTransport,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tokio::{signal, sync::watch};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing();

    // Load configuration
    let config = config::AppConfig::load()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = if config::AppConfig::is_production() { "production" } else { "development" },
        "Starting Fitness Coach Backend"
    );

    // Validate production configuration
    if config::AppConfig::is_production() {
        validate_production_config(&config)?;
    }

    let metrics = PrometheusBuilder::new().install_recorder()?;

    // Create database pool
    info!("Connecting to database...");
    let db_pool = db::create_pool(&config.database).await?;

    // Run migrations (skip in production if using separate migration job)
    if !config::AppConfig::is_production() {
        db::run_migrations(&db_pool).await?;
    }

    let transport = TelegramTransport::new(&config.telegram);
    if !transport.is_configured() {
        warn!("Telegram bot token not set. Reminders will fail delivery and be retried.");
    }

    let generator: Arc<dyn ContentGenerator> = if config.ai.enabled {
        info!(model = %config.ai.model, url = %config.ai.ollama_url, "Using Ollama content generator");
        Arc::new(OllamaGenerator::new(&config.ai))
    } else {
        info!("Content generation disabled. Using fallback plans.");
        Arc::new(DisabledGenerator)
    };

    // Create application state
    let state = AppState::new(Arc::new(PgStore::new(db_pool)), Arc::new(transport), config.clone())
        .with_generator(generator)
        .with_metrics(metrics);

    // Start the reminder dispatcher
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let dispatcher = ReminderDispatcher::from_state(&state).spawn(shutdown_rx);

    // Build application
    let app = routes::create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!(address = %addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let the dispatcher finish its current tick
    let _ = shutdown_tx.send(true);
    if let Err(e) = dispatcher.await {
        error!(error = %e, "Reminder dispatcher task failed");
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config::AppConfig::is_production() {
            "fitness_coach_backend=info,tower_http=info".into()
        } else {
            "fitness_coach_backend=debug,tower_http=debug,sqlx=warn".into()
        }
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config::AppConfig::is_production() {
        // JSON logging for production (better for log aggregation)
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        // Pretty logging for development
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

/// Validate configuration for production deployment
fn validate_production_config(config: &config::AppConfig) -> Result<()> {
    let mut errors = Vec::new();

    if config.telegram.bot_token.is_empty() {
        errors.push("Telegram bot token must be set");
    }

    if config.telegram.webhook_secret.is_empty() {
        warn!("Telegram webhook secret is empty - webhook requests are not authenticated");
    }

    // Check database URL is not localhost in production
    if config.database.url.contains("localhost") || config.database.url.contains("127.0.0.1") {
        warn!("Database URL contains localhost - ensure this is intentional for production");
    }

    if !errors.is_empty() {
        for err in &errors {
            error!("Configuration error: {}", err);
        }
        anyhow::bail!("Invalid production configuration");
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
