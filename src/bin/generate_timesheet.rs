use shiftsheet::components::google_auth::GoogleOAuth;
use shiftsheet::components::sheets::ProvisionOutcome;
use shiftsheet::components::timesheet::journal_from_config;
use shiftsheet::components::{TimesheetRequest, TimesheetService};
use shiftsheet::config::Config;
use shiftsheet::error::{auth_error, other_error};
use shiftsheet::utils::http::build_client;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

/// Where the local callback server listens; must be registered with the OAuth client
const REDIRECT_URI: &str = "http://localhost:8080";

#[tokio::main]
async fn main() -> miette::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Position code, defaults to Summer Teacher
    let position_code = std::env::args().nth(1).unwrap_or_else(|| "S".to_string());

    let config = Config::load()?;
    let client = build_client(&config)?;
    let oauth = GoogleOAuth::with_redirect(&config, client.clone(), REDIRECT_URI);

    // Generate random state for security
    let state = uuid::Uuid::new_v4().to_string();
    let auth_url = oauth.authorization_url(&state)?;

    println!("Opening browser for Google authorization...");
    if webbrowser::open(auth_url.as_str()).is_err() {
        println!("Could not open a browser, visit this URL instead:\n{}", auth_url);
    }

    // Start local server to receive the callback
    let server = tiny_http::Server::http("127.0.0.1:8080")
        .map_err(|e| other_error(&format!("Failed to start callback server: {}", e)))?;
    println!("Waiting for authorization callback...");

    let request = server
        .recv()
        .map_err(|e| other_error(&format!("Failed to receive callback: {}", e)))?;
    let callback = Url::parse(&format!("{}{}", REDIRECT_URI, request.url()))
        .map_err(|e| other_error(&format!("Failed to parse callback URL: {}", e)))?;

    let param = |name: &str| {
        callback
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };
    if param("state").as_deref() != Some(state.as_str()) {
        return Err(auth_error("State in callback does not match").into());
    }
    let code = param("code").ok_or_else(|| auth_error("No authorization code found in callback"))?;

    let credentials = oauth.exchange_code(&code).await?;
    let profile = oauth.fetch_profile(&credentials).await?;

    let response =
        tiny_http::Response::from_string("Authorization successful! You can close this window.");
    request
        .respond(response)
        .map_err(|e| other_error(&format!("Failed to answer callback: {}", e)))?;

    info!("Signed in as {}", profile.name);

    let journal = journal_from_config(&config).await;
    let service = TimesheetService::new(Arc::new(config), client, journal);
    let outcome = service
        .generate(
            &credentials,
            &TimesheetRequest {
                full_name: profile.name.clone(),
                position_code,
            },
        )
        .await?;

    match outcome {
        ProvisionOutcome::Created { spreadsheet_id } => {
            println!("A new timesheet was created: {}", spreadsheet_id)
        }
        ProvisionOutcome::Resumed { spreadsheet_id, from } => {
            println!("Finished timesheet {} (was stopped after {:?})", spreadsheet_id, from)
        }
        ProvisionOutcome::AlreadyExists { spreadsheet_id } => {
            println!("This month's timesheet already exists: {}", spreadsheet_id)
        }
        ProvisionOutcome::Busy => println!("Another run is generating this timesheet right now"),
    }

    Ok(())
}
