use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Refresh this many seconds before Google would reject the token
const EXPIRY_LEEWAY_SECS: i64 = 60;

/// Per-request Google credentials
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoogleCredentials {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Unix timestamp after which the access token is no longer valid
    pub expires_at: i64,
}

impl GoogleCredentials {
    /// Credentials from a token endpoint response received at `now`
    pub fn from_token_response(token: TokenResponse, now: DateTime<Utc>) -> Self {
        Self {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: now.timestamp() + token.expires_in.unwrap_or(3600),
        }
    }

    /// Whether the access token must be refreshed before use
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - EXPIRY_LEEWAY_SECS <= now.timestamp()
    }
}

/// Body returned by the OAuth token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

/// OpenID profile of the signed-in employee
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub sub: String,
    pub name: String,
    pub given_name: Option<String>,
}

/// The part of a full name before the first space
pub fn first_name_of(full_name: &str) -> &str {
    full_name.split(' ').next().unwrap_or(full_name)
}
