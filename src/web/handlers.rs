use super::auth::{Session, SESSION_COOKIE, STATE_COOKIE};
use super::AppState;
use crate::components::sheets::ProvisionOutcome;
use crate::components::TimesheetRequest;
use crate::error::Error;
use askama::Template;
use axum::{
    extract::{Extension, Form, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate;

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate<'a> {
    first_name: &'a str,
    uri: &'a str,
}

#[derive(Template)]
#[template(path = "done.html")]
struct DoneTemplate<'a> {
    message: &'a str,
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate<'a> {
    message: &'a str,
}

/// Error page with a status code
#[derive(Debug)]
pub struct PageError {
    status: StatusCode,
    message: String,
}

impl PageError {
    fn new(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }
}

impl From<Error> for PageError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::Auth(_) => StatusCode::UNAUTHORIZED,
            Error::GoogleApi(_) | Error::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match (ErrorTemplate { message: &self.message }).render() {
            Ok(body) => (self.status, Html(body)).into_response(),
            Err(e) => {
                error!("Failed to render error page: {}", e);
                (self.status, self.message).into_response()
            }
        }
    }
}

fn render<T: Template>(template: &T) -> Result<Html<String>, PageError> {
    template.render().map(Html).map_err(|e| {
        error!("Failed to render template: {}", e);
        PageError::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page")
    })
}

/// Handler for the landing page
pub async fn home_handler() -> Result<Html<String>, PageError> {
    render(&LoginTemplate)
}

/// Send the browser to Google's consent screen
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), PageError> {
    let oauth_state = uuid::Uuid::new_v4().to_string();
    let url = state.oauth.authorization_url(&oauth_state)?;

    let cookie = Cookie::build((STATE_COOKIE, oauth_state))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(10))
        .build();

    Ok((jar.add(cookie), Redirect::to(url.as_str())))
}

/// Query string Google appends to the callback
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Finish the OAuth flow and start a session
pub async fn callback_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect), PageError> {
    if let Some(reason) = params.error {
        warn!("Google denied authorization: {}", reason);
        return Err(PageError::new(StatusCode::UNAUTHORIZED, "Authorization was denied"));
    }

    let expected = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    if expected.is_none() || expected != params.state {
        warn!("OAuth state mismatch on callback");
        return Err(PageError::new(StatusCode::BAD_REQUEST, "State does not match"));
    }

    let code = params
        .code
        .ok_or_else(|| PageError::new(StatusCode::BAD_REQUEST, "Missing authorization code"))?;

    let credentials = state.oauth.exchange_code(&code).await?;
    let profile = state.oauth.fetch_profile(&credentials).await?;
    info!("{} signed in", profile.name);

    let token = state
        .sessions
        .issue(&profile, &credentials)
        .map_err(|e| PageError::new(StatusCode::INTERNAL_SERVER_ERROR, &format!("{:?}", e)))?;

    let jar = jar
        .remove(Cookie::build(STATE_COOKIE).path("/"))
        .add(state.sessions.cookie(token));
    Ok((jar, Redirect::to("/protected_area")))
}

/// End the session
pub async fn logout_handler(jar: CookieJar) -> (CookieJar, Redirect) {
    (jar.remove(Cookie::build(SESSION_COOKIE).path("/")), Redirect::to("/"))
}

/// Page with the position form
pub async fn protected_area_handler(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Html<String>, PageError> {
    render(&IndexTemplate {
        first_name: session.claims.display_first_name(),
        uri: &state.config.public_uri,
    })
}

/// Form posted from the position page
#[derive(Debug, Deserialize)]
pub struct PositionForm {
    pub position: String,
}

/// Generate the timesheet for the signed-in employee
pub async fn generate_handler(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    jar: CookieJar,
    Form(form): Form<PositionForm>,
) -> Result<(CookieJar, Html<String>), PageError> {
    let claims = session.claims;
    let current = claims.credentials();
    let credentials = state.oauth.ensure_fresh(current.clone()).await?;

    let jar = if credentials != current {
        let token = state
            .sessions
            .reissue(&claims, &credentials)
            .map_err(|e| PageError::new(StatusCode::INTERNAL_SERVER_ERROR, &format!("{:?}", e)))?;
        jar.add(state.sessions.cookie(token))
    } else {
        jar
    };

    let request = TimesheetRequest {
        full_name: claims.name.clone(),
        position_code: form.position.trim().to_string(),
    };
    // Runs detached so a client disconnect cannot cancel it midway
    let timesheets = Arc::clone(&state.timesheets);
    let outcome = tokio::spawn(async move { timesheets.generate(&credentials, &request).await })
        .await
        .map_err(|e| {
            error!("Timesheet task failed: {}", e);
            PageError::new(StatusCode::INTERNAL_SERVER_ERROR, "Timesheet generation failed")
        })??;

    let message = match outcome {
        ProvisionOutcome::Created { .. } => "Your timesheet has been created in Google Sheets.",
        ProvisionOutcome::Resumed { .. } => "Your timesheet has been completed in Google Sheets.",
        ProvisionOutcome::AlreadyExists { .. } => "Your timesheet for this month already exists.",
        ProvisionOutcome::Busy => "Your timesheet is being generated, check Google Sheets shortly.",
    };
    Ok((jar, render(&DoneTemplate { message })?))
}

/// Handler for health check
pub async fn health_handler() -> &'static str {
    "OK"
}
