//! taxi-fleet server and management commands

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use taxi_fleet::{
    config::{TaxiConfig, DEFAULT_CONFIG_FILE},
    models::{Driver, NewDriver},
    observability,
    state::{AppState, MIGRATOR},
};

#[derive(Parser)]
#[command(name = "taxi-fleet")]
#[command(version)]
#[command(about = "Taxi fleet administration service", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, env = "TAXI_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Create a staff superuser
    CreateSuperuser {
        /// Login name
        #[arg(long)]
        username: String,
        /// Initial password
        #[arg(long, env = "TAXI_SUPERUSER_PASSWORD")]
        password: String,
        /// Driving license number
        #[arg(long, default_value = "")]
        license_number: String,
    },
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    observability::init()?;

    let config = TaxiConfig::load_from(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::CreateSuperuser {
            username,
            password,
            license_number,
        } => {
            let state = AppState::connect(config).await?;
            let driver = Driver::create_superuser(
                state.pool(),
                state.hasher(),
                &NewDriver::new(username, password, license_number),
            )
            .await?;
            println!("Superuser \"{}\" created.", driver.username);
            Ok(())
        }
        Commands::Migrate => {
            let pool = sqlx::SqlitePool::connect(&config.database.url).await?;
            MIGRATOR.run(&pool).await?;
            tracing::info!(url = %config.database.url, "migrations applied");
            Ok(())
        }
    }
}

async fn serve(config: TaxiConfig) -> Result<()> {
    let addr = config.service.bind_address();
    let name = config.service.name.clone();
    let state = AppState::connect(config).await?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(service = %name, %addr, "listening");

    axum::serve(listener, taxi_fleet::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
