use crate::shutdown;
use shiftsheet::components::timesheet::journal_from_config;
use shiftsheet::config::Config;
use shiftsheet::error::Error;
use shiftsheet::web::{router, AppState};
use std::net::SocketAddr;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging(default_filter: &str) -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the application config
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => {
            info!(
                "Reading shifts booked by {} from calendar '{}'",
                config.target_email, config.calendar_id
            );
            Ok(config)
        }
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Build the app and serve it until a shutdown signal arrives
pub async fn start_server(config: Config) -> miette::Result<()> {
    let journal = journal_from_config(&config).await;
    let port = config.port;

    let state = AppState::new(config, journal)?;
    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(Error::from)?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::wait_for_signal())
        .await
        .map_err(Error::from)?;

    info!("Server shut down");
    Ok(())
}
