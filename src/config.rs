use crate::error::{config_error, env_error, TimesheetResult};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Calendar read when none is configured
pub const DEFAULT_CALENDAR_ID: &str = "primary";

/// Google caps a single events page at this many entries for our query
pub const DEFAULT_MAX_RESULTS: u32 = 50;

/// Optional tunables file, relative to the working directory
pub const TUNABLES_PATH: &str = "config/timesheet.toml";

/// Google endpoints the clients talk to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoogleEndpoints {
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub calendar_base: String,
    pub drive_base: String,
    pub sheets_base: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_url: "https://openidconnect.googleapis.com/v1/userinfo".to_string(),
            calendar_base: "https://www.googleapis.com/calendar/v3".to_string(),
            drive_base: "https://www.googleapis.com/drive/v3".to_string(),
            sheets_base: "https://sheets.googleapis.com/v4".to_string(),
        }
    }
}

impl GoogleEndpoints {
    /// Point every endpoint at one base URL, used against mock servers
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            auth_url: format!("{}/o/oauth2/v2/auth", base),
            token_url: format!("{}/token", base),
            userinfo_url: format!("{}/v1/userinfo", base),
            calendar_base: format!("{}/calendar/v3", base),
            drive_base: format!("{}/drive/v3", base),
            sheets_base: format!("{}/v4", base),
        }
    }
}

/// Values that may be overridden from `config/timesheet.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tunables {
    pub calendar_id: Option<String>,
    pub max_results: Option<u32>,
    pub legacy_position_label: Option<bool>,
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// OAuth client ID
    pub google_client_id: String,
    /// OAuth client secret
    pub google_client_secret: String,
    /// Redirect URI registered for the OAuth client
    pub callback_uri: String,
    /// Scheduling account whose events become shifts, lower-cased
    pub target_email: String,
    /// Secret used to sign session tokens
    pub secret_key: String,
    /// Public base URL the pages post back to
    pub public_uri: String,
    /// Redis connection string for the provisioning journal
    pub redis_url: Option<String>,
    /// Calendar to read events from
    pub calendar_id: String,
    /// Maximum number of events fetched per month
    pub max_results: u32,
    /// Write "Summer Teacher" on every row like the first release did
    pub legacy_position_label: bool,
    /// Web server port
    pub port: u16,
    /// Timeout applied to every Google request
    pub http_timeout_secs: u64,
    /// Session lifetime in minutes
    pub session_ttl_minutes: i64,
    /// Google endpoints
    pub endpoints: GoogleEndpoints,
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> TimesheetResult<Self> {
        dotenv().ok();

        let google_client_id =
            env::var("GOOGLE_CLIENT_ID").map_err(|_| env_error("GOOGLE_CLIENT_ID"))?;
        let google_client_secret =
            env::var("GOOGLE_CLIENT_SECRET").map_err(|_| env_error("GOOGLE_CLIENT_SECRET"))?;
        let target_email = env::var("TARGET_EMAIL")
            .map_err(|_| env_error("TARGET_EMAIL"))?
            .trim()
            .to_lowercase();
        if target_email.is_empty() {
            return Err(config_error("TARGET_EMAIL must not be empty"));
        }

        let callback_uri = env::var("CALLBACK_URI")
            .unwrap_or_else(|_| String::from("http://localhost:3000/callback"));
        let secret_key =
            env::var("SECRET_KEY").unwrap_or_else(|_| uuid::Uuid::new_v4().to_string());
        let public_uri = env::var("URI").unwrap_or_default();
        let redis_url = env::var("REDIS_URL").ok().filter(|url| !url.is_empty());

        let port = match env::var("PORT") {
            Ok(port) => port
                .parse::<u16>()
                .map_err(|_| config_error("Invalid PORT format"))?,
            Err(_) => 3000,
        };
        let http_timeout_secs = match env::var("HTTP_TIMEOUT_SECS") {
            Ok(secs) => secs
                .parse::<u64>()
                .map_err(|_| config_error("Invalid HTTP_TIMEOUT_SECS format"))?,
            Err(_) => 30,
        };
        let session_ttl_minutes = match env::var("SESSION_TTL_MINUTES") {
            Ok(minutes) => minutes
                .parse::<i64>()
                .map_err(|_| config_error("Invalid SESSION_TTL_MINUTES format"))?,
            Err(_) => 8 * 60,
        };

        let mut config = Config {
            google_client_id,
            google_client_secret,
            callback_uri,
            target_email,
            secret_key,
            public_uri,
            redis_url,
            calendar_id: env::var("CALENDAR_ID")
                .unwrap_or_else(|_| String::from(DEFAULT_CALENDAR_ID)),
            max_results: DEFAULT_MAX_RESULTS,
            legacy_position_label: false,
            port,
            http_timeout_secs,
            session_ttl_minutes,
            endpoints: GoogleEndpoints::default(),
        };

        if Path::new(TUNABLES_PATH).exists() {
            let content = fs::read_to_string(TUNABLES_PATH)?;
            config.apply_tunables(toml::from_str::<Tunables>(&content)?);
        }

        Ok(config)
    }

    /// Merge file-provided tunables over the environment values
    pub fn apply_tunables(&mut self, tunables: Tunables) {
        if let Some(calendar_id) = tunables.calendar_id {
            self.calendar_id = calendar_id;
        }
        if let Some(max_results) = tunables.max_results {
            self.max_results = max_results;
        }
        if let Some(legacy) = tunables.legacy_position_label {
            self.legacy_position_label = legacy;
        }
    }

    /// A config with fixed values for tests and tooling
    pub fn for_target(target_email: &str, endpoints: GoogleEndpoints) -> Self {
        Config {
            google_client_id: "test-client-id".to_string(),
            google_client_secret: "test-client-secret".to_string(),
            callback_uri: "http://localhost:3000/callback".to_string(),
            target_email: target_email.to_lowercase(),
            secret_key: "test-secret".to_string(),
            public_uri: String::new(),
            redis_url: None,
            calendar_id: DEFAULT_CALENDAR_ID.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            legacy_position_label: false,
            port: 3000,
            http_timeout_secs: 30,
            session_ttl_minutes: 60,
            endpoints,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tunables_override_only_given_values() {
        let mut config = Config::for_target("Scheduler@Example.com", GoogleEndpoints::default());
        let tunables: Tunables = toml::from_str("legacy_position_label = true").unwrap();
        config.apply_tunables(tunables);

        assert!(config.legacy_position_label);
        assert_eq!(config.max_results, DEFAULT_MAX_RESULTS);
        assert_eq!(config.calendar_id, "primary");
        assert_eq!(config.target_email, "scheduler@example.com");
    }

    #[test]
    fn endpoints_with_base_strip_trailing_slash() {
        let endpoints = GoogleEndpoints::with_base("http://127.0.0.1:9999/");
        assert_eq!(endpoints.token_url, "http://127.0.0.1:9999/token");
        assert_eq!(endpoints.sheets_base, "http://127.0.0.1:9999/v4");
    }
}
