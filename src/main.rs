//! # Stockroom Server Main Driver
//!
//! ## Purpose
//! Main entry point for the inventory service. Loads configuration,
//! initializes logging and storage, and starts the web server.
//!
//! ## Architecture Flow
//! 1. Parse command line arguments and load configuration
//! 2. Initialize logging and tracing
//! 3. Open the model store and build the inventory engine
//! 4. Start the web API server
//! 5. Handle shutdown signals gracefully

use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use stockroom::{
    api::ApiServer,
    config::Config,
    engine::InventoryEngine,
    errors::{Result, StockError},
    storage::ModelStore,
    AppState,
};

#[derive(Debug, Parser)]
#[command(
    name = "stockroom-server",
    version,
    about = "Inventory matching and suggestion service"
)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Override the server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Run health checks and exit
    #[arg(long)]
    check_health: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::from_file(&args.config)?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    let config = Arc::new(config);

    init_logging(&config)?;

    info!("Starting Stockroom v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", args.config);

    let app_state = initialize_components(config.clone()).await?;

    if args.check_health {
        app_state.store.health_check().await?;
        info!("All health checks passed");
        return Ok(());
    }

    let server = ApiServer::new(app_state.clone());
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            error!("Server error: {}", e);
        }
    });

    info!(
        "Stockroom started on {}:{}",
        config.server.host, config.server.port
    );

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        _ = server_handle => {
            warn!("Server stopped unexpectedly");
        }
    }

    info!("Stockroom shut down successfully");
    Ok(())
}

/// Initialize logging and tracing
fn init_logging(config: &Config) -> Result<()> {
    let log_level: tracing::Level =
        config
            .logging
            .level
            .parse()
            .map_err(|_| StockError::Config {
                message: format!("Invalid log level: {}", config.logging.level),
            })?;
    let filter = tracing_subscriber::filter::LevelFilter::from_level(log_level);

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true);
    let fmt_layer = if config.logging.json_format {
        fmt_layer.json().with_filter(filter).boxed()
    } else {
        fmt_layer.with_filter(filter).boxed()
    };

    tracing_subscriber::registry().with(fmt_layer).init();

    info!("Logging initialized with level: {}", config.logging.level);
    Ok(())
}

/// Initialize all application components
async fn initialize_components(config: Arc<Config>) -> Result<AppState> {
    info!("Initializing model store...");
    let store = Arc::new(ModelStore::new(config.storage.clone()).await?);
    store.health_check().await?;

    info!("Initializing inventory engine...");
    let engine = Arc::new(InventoryEngine::new(config.clone(), store.clone()));

    info!("All components initialized successfully");
    Ok(AppState {
        config,
        engine,
        store,
    })
}
