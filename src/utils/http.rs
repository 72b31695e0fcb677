use crate::config::Config;
use crate::error::{google_api_error, TimesheetResult};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Build the shared HTTP client used for every Google call
pub fn build_client(config: &Config) -> TimesheetResult<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()?;
    Ok(client)
}

/// Turn a non-success response into an error carrying the status and body
pub async fn ensure_success(response: Response, context: &str) -> TimesheetResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let error_body = response
        .text()
        .await
        .unwrap_or_else(|_| "Could not read error response".to_string());
    Err(google_api_error(&format!(
        "{}: HTTP {} - {}",
        context, status, error_body
    )))
}

/// Check the status and decode the JSON body
pub async fn read_json<T: DeserializeOwned>(response: Response, context: &str) -> TimesheetResult<T> {
    let response = ensure_success(response, context).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| google_api_error(&format!("{}: failed to parse response: {}", context, e)))
}
