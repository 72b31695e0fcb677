mod shutdown;
mod startup;

use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging("info,tower_http=debug")?;

    info!("Starting timesheet server");

    // Load configuration
    let config = startup::load_config()?;

    // Start the web server
    startup::start_server(config).await
}
