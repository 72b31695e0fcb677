use super::credentials::{GoogleCredentials, TokenResponse, UserProfile};
use crate::config::Config;
use crate::error::{auth_error, TimesheetResult};
use crate::utils::http::read_json;
use chrono::Utc;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

/// Scopes needed to read the calendar and write the timesheet
pub const SCOPES: [&str; 5] = [
    "openid",
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive.readonly",
    "https://www.googleapis.com/auth/calendar.readonly",
    "https://www.googleapis.com/auth/userinfo.profile",
];

/// OAuth client for the authorization code flow
#[derive(Clone)]
pub struct GoogleOAuth {
    client: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    auth_url: String,
    token_url: String,
    userinfo_url: String,
}

impl GoogleOAuth {
    /// Create a client redirecting to the configured callback
    pub fn new(config: &Config, client: Client) -> Self {
        Self::with_redirect(config, client, &config.callback_uri)
    }

    /// Create a client with an explicit redirect URI
    pub fn with_redirect(config: &Config, client: Client, redirect_uri: &str) -> Self {
        Self {
            client,
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            redirect_uri: redirect_uri.to_string(),
            auth_url: config.endpoints.auth_url.clone(),
            token_url: config.endpoints.token_url.clone(),
            userinfo_url: config.endpoints.userinfo_url.clone(),
        }
    }

    /// URL the browser is sent to; offline access so a refresh token is issued
    pub fn authorization_url(&self, state: &str) -> TimesheetResult<Url> {
        let mut url = Url::parse(&self.auth_url)
            .map_err(|e| auth_error(&format!("Failed to parse URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &SCOPES.join(" "))
            .append_pair("access_type", "offline")
            .append_pair("include_granted_scopes", "true")
            .append_pair("prompt", "consent")
            .append_pair("state", state);

        Ok(url)
    }

    /// Exchange an authorization code for tokens
    pub async fn exchange_code(&self, code: &str) -> TimesheetResult<GoogleCredentials> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| auth_error(&format!("Failed to exchange code: {}", e)))?;

        let token: TokenResponse = read_json(response, "Failed to exchange code").await?;
        info!("Authorization code exchanged for tokens");
        Ok(GoogleCredentials::from_token_response(token, Utc::now()))
    }

    /// Refresh an expired access token, keeping the existing refresh token
    pub async fn refresh(&self, credentials: &GoogleCredentials) -> TimesheetResult<GoogleCredentials> {
        let refresh_token = credentials
            .refresh_token
            .as_deref()
            .ok_or_else(|| auth_error("No refresh token in credentials"))?;

        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| auth_error(&format!("Failed to refresh token: {}", e)))?;

        let token: TokenResponse = read_json(response, "Failed to refresh token").await?;
        let mut refreshed = GoogleCredentials::from_token_response(token, Utc::now());
        if refreshed.refresh_token.is_none() {
            refreshed.refresh_token = Some(refresh_token.to_string());
        }
        debug!("Access token refreshed, expires at {}", refreshed.expires_at);
        Ok(refreshed)
    }

    /// Return usable credentials, refreshing them if they have expired
    pub async fn ensure_fresh(&self, credentials: GoogleCredentials) -> TimesheetResult<GoogleCredentials> {
        if credentials.is_expired(Utc::now()) {
            self.refresh(&credentials).await
        } else {
            Ok(credentials)
        }
    }

    /// Read the signed-in user's OpenID profile
    pub async fn fetch_profile(&self, credentials: &GoogleCredentials) -> TimesheetResult<UserProfile> {
        let response = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(&credentials.access_token)
            .send()
            .await
            .map_err(|e| auth_error(&format!("Failed to fetch profile: {}", e)))?;

        read_json(response, "Failed to fetch profile").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GoogleEndpoints;

    #[test]
    fn authorization_url_requests_offline_access() {
        let config = Config::for_target("scheduler@example.com", GoogleEndpoints::default());
        let oauth = GoogleOAuth::new(&config, Client::new());
        let url = oauth.authorization_url("abc123").unwrap();

        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["client_id"], "test-client-id");
        assert_eq!(pairs["access_type"], "offline");
        assert_eq!(pairs["state"], "abc123");
        assert_eq!(pairs["redirect_uri"], "http://localhost:3000/callback");
        assert!(pairs["scope"].contains("calendar.readonly"));
        assert!(pairs["scope"].starts_with("openid "));
    }
}
