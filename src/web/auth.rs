use super::AppState;
use crate::components::google_auth::{GoogleCredentials, UserProfile};
use axum::extract::{Request, State};
use axum::http::{header, request::Parts, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

/// Cookie holding the signed session
pub const SESSION_COOKIE: &str = "session";

/// Cookie holding the OAuth `state` between `/login` and `/callback`
pub const STATE_COOKIE: &str = "oauth_state";

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Google account id
    pub sub: String,
    /// Full name
    pub name: String,
    /// Given name from the profile
    pub given_name: Option<String>,
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// When the Google access token expires (Unix timestamp)
    pub token_expires_at: i64,
    /// Expiration time (as UTC timestamp)
    pub exp: usize,
    /// Issued at (as UTC timestamp)
    pub iat: usize,
}

impl Claims {
    /// Google credentials carried by this session
    pub fn credentials(&self) -> GoogleCredentials {
        GoogleCredentials {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            expires_at: self.token_expires_at,
        }
    }

    /// Name shown on the pages
    pub fn display_first_name(&self) -> &str {
        self.given_name
            .as_deref()
            .unwrap_or_else(|| crate::components::google_auth::first_name_of(&self.name))
    }
}

/// Session configuration
#[derive(Clone)]
pub struct SessionConfig {
    /// Secret for signing/verifying tokens
    pub secret: String,
    /// Session lifetime in minutes
    pub ttl_minutes: i64,
}

/// Authentication error
#[derive(Debug)]
pub enum AuthError {
    /// Token is missing
    MissingToken,
    /// Token is invalid or expired
    InvalidToken,
    /// Some other error
    Other(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingToken | AuthError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "Sign in required").into_response()
            }
            AuthError::Other(err) => {
                error!("Auth error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

/// Session attached to authenticated requests
#[derive(Debug, Clone)]
pub struct Session {
    pub claims: Claims,
}

/// Extract the session token from the cookie, or an Authorization bearer header
pub fn extract_token(parts: &Parts) -> Result<String, AuthError> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Ok(cookie.value().to_string());
    }

    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?;
    let auth_str = auth_header.to_str().map_err(|_| AuthError::InvalidToken)?;

    auth_str
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .ok_or(AuthError::InvalidToken)
}

/// Signs and verifies session tokens
pub struct SessionService {
    config: Arc<SessionConfig>,
}

impl SessionService {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Issue a session for a signed-in user
    pub fn issue(&self, profile: &UserProfile, credentials: &GoogleCredentials) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.config.ttl_minutes);

        let claims = Claims {
            sub: profile.sub.clone(),
            name: profile.name.clone(),
            given_name: profile.given_name.clone(),
            access_token: credentials.access_token.clone(),
            refresh_token: credentials.refresh_token.clone(),
            token_expires_at: credentials.expires_at,
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        self.sign(&claims)
    }

    /// Re-sign existing claims with refreshed Google credentials
    pub fn reissue(&self, claims: &Claims, credentials: &GoogleCredentials) -> Result<String, AuthError> {
        let claims = Claims {
            access_token: credentials.access_token.clone(),
            refresh_token: credentials.refresh_token.clone(),
            token_expires_at: credentials.expires_at,
            ..claims.clone()
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(self.config.secret.as_bytes()),
        )
        .map_err(|e| AuthError::Other(format!("Failed to generate token: {}", e)))
    }

    /// Validate a session token
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|token_data| token_data.claims)
        .map_err(|e| {
            error!("JWT validation error: {:?}", e);
            AuthError::InvalidToken
        })
    }

    /// Cookie carrying a session token
    pub fn cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::minutes(self.config.ttl_minutes))
            .build()
    }
}

/// Reject requests without a valid session, attach the session otherwise
pub async fn require_session(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let (parts, body) = req.into_parts();
    let token = extract_token(&parts)?;
    let claims = state.sessions.validate(&token)?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(Session { claims });
    Ok(next.run(req).await)
}
