//! Inspection tracker service entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use inspection_tracker::api::{cors_layer, create_router, AppState};
use inspection_tracker::config::Config;
use inspection_tracker::error::AppError;
use inspection_tracker::inspection::InspectionService;
use inspection_tracker::metrics::MetricsHandle;
use inspection_tracker::startup::{prepare_store, ConnectRetry};
use inspection_tracker::store::{sample_inspections, InspectionStore, PgInspectionStore};
use inspection_tracker::utils::shutdown_signal;

/// Inspection tracking REST service.
#[derive(Parser, Debug)]
#[command(name = "inspection-tracker")]
#[command(about = "REST API for recording site inspections and their review status")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP listen port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Wait for the database, ensure the schema, and serve the API (default).
    Serve {
        /// HTTP listen port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Wait for the database and ensure the schema, then exit.
    Migrate,

    /// Ensure the schema and insert sample inspections.
    Seed,

    /// Check configuration validity.
    CheckConfig,
}

fn init_logging(verbose: bool, config: Option<&Config>) {
    let filter = if verbose {
        EnvFilter::new("inspection_tracker=debug,tower_http=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(config.map(|c| c.rust_log.as_str()).unwrap_or("info"))
        })
    };

    let json = config.is_some_and(|c| c.log_json);
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Configuration is needed for log format; report load errors after logging is up
    let loaded = Config::load();
    init_logging(args.verbose, loaded.as_ref().ok());

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(loaded),
        Some(Command::Migrate) => cmd_migrate(load_config(loaded)?).await,
        Some(Command::Seed) => cmd_seed(load_config(loaded)?).await,
        Some(Command::Serve { port }) => cmd_serve(load_config(loaded)?, port.or(args.port)).await,
        None => cmd_serve(load_config(loaded)?, args.port).await,
    }
}

/// Unwrap and validate a loaded configuration.
fn load_config(loaded: Result<Config, envy::Error>) -> inspection_tracker::Result<Config> {
    let config = loaded.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        AppError::from(e)
    })?;

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(AppError::InvalidConfig(e));
    }

    Ok(config)
}

/// Check configuration validity.
fn cmd_check_config(loaded: Result<Config, envy::Error>) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("INSPECTION TRACKER - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match loaded {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Database: {}", config.redacted_database_url());
    println!("  Pool Size: {}", config.db_max_connections);
    println!(
        "  Startup Probe: {} attempts every {}ms",
        config.db_connect_attempts, config.db_connect_interval_ms
    );
    println!("  Port: {}", config.port);
    println!("  CORS: {}", if config.cors_permissive { "Permissive" } else { "Disabled" });
    println!("  Log Format: {}", if config.log_json { "JSON" } else { "Text" });
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Connect the pool and run the startup sequence.
async fn open_store(config: &Config) -> inspection_tracker::Result<PgInspectionStore> {
    let store = PgInspectionStore::connect_lazy(config)?;

    let retry = ConnectRetry::from_config(config);
    info!(
        max_attempts = retry.max_attempts,
        interval_ms = retry.interval_ms,
        "Waiting for database..."
    );

    if let Err(e) = prepare_store(&store, &retry).await {
        error!("Startup failed: {}", e);
        store.close().await;
        return Err(e.into());
    }

    Ok(store)
}

/// Ensure the schema and exit.
async fn cmd_migrate(config: Config) -> anyhow::Result<()> {
    let store = open_store(&config).await?;
    info!("Migration complete");
    store.close().await;
    Ok(())
}

/// Insert sample inspections.
async fn cmd_seed(config: Config) -> anyhow::Result<()> {
    let store = open_store(&config).await?;

    let result = store.seed(&sample_inspections()).await;
    store.close().await;

    let written = result?;
    info!(rows = written, "Seeded sample inspections");
    Ok(())
}

/// Run the API server until a shutdown signal arrives.
async fn cmd_serve(config: Config, port_override: Option<u16>) -> anyhow::Result<()> {
    let port = port_override.unwrap_or(config.port);

    let metrics = MetricsHandle::install()?;
    let store = Arc::new(open_store(&config).await?);

    let service = InspectionService::new(store.clone());
    let mut router = create_router(AppState::new(service, metrics));
    if config.cors_permissive {
        router = router.layer(cors_layer());
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("API listening on {}", addr);

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    store.close().await;
    info!("Shutdown complete");

    served?;
    Ok(())
}
