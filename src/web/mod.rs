pub mod auth;
pub mod handlers;

use crate::components::google_auth::GoogleOAuth;
use crate::components::sheets::ProvisionJournal;
use crate::components::TimesheetService;
use crate::config::Config;
use crate::error::TimesheetResult;
use crate::utils::http::build_client;
use auth::{require_session, SessionConfig, SessionService};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use handlers::{
    callback_handler, generate_handler, health_handler, home_handler, login_handler, logout_handler,
    protected_area_handler,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// OAuth client for the authorization code flow
    pub oauth: Arc<GoogleOAuth>,
    /// Session signing
    pub sessions: Arc<SessionService>,
    /// Extraction and provisioning
    pub timesheets: Arc<TimesheetService>,
}

impl AppState {
    /// Wire up the state from configuration and a provisioning journal
    pub fn new(config: Config, journal: Arc<dyn ProvisionJournal>) -> TimesheetResult<Self> {
        let config = Arc::new(config);
        let client = build_client(&config)?;

        let oauth = Arc::new(GoogleOAuth::new(&config, client.clone()));
        let sessions = Arc::new(SessionService::new(SessionConfig {
            secret: config.secret_key.clone(),
            ttl_minutes: config.session_ttl_minutes,
        }));
        let timesheets = Arc::new(TimesheetService::new(Arc::clone(&config), client, journal));

        Ok(Self {
            config,
            oauth,
            sessions,
            timesheets,
        })
    }
}

/// Build the router
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/protected_area", get(protected_area_handler))
        .route("/protected_area2", post(generate_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/", get(home_handler))
        .route("/login", get(login_handler))
        .route("/callback", get(callback_handler))
        .route("/logout", get(logout_handler))
        .route("/health", get(health_handler))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::google_auth::{GoogleCredentials, UserProfile};
    use crate::components::sheets::InMemoryJournal;
    use crate::config::GoogleEndpoints;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;
    use tower::ServiceExt;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn state() -> AppState {
        let config = Config::for_target("scheduler@example.com", GoogleEndpoints::default());
        AppState::new(config, Arc::new(InMemoryJournal::default())).unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = router(state())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "OK");
    }

    #[tokio::test]
    async fn protected_area_requires_a_session() {
        let response = router(state())
            .oneshot(Request::builder().uri("/protected_area").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_redirects_to_google_with_state_cookie() {
        let response = router(state())
            .oneshot(Request::builder().uri("/login").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("oauth_state="));
    }

    #[tokio::test]
    async fn callback_without_state_cookie_is_rejected() {
        let response = router(state())
            .oneshot(
                Request::builder()
                    .uri("/callback?code=abc&state=forged")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn signed_in_user_sees_the_form() {
        let state = state();
        let token = state
            .sessions
            .issue(
                &UserProfile {
                    sub: "1234".to_string(),
                    name: "Leul Mekonnen".to_string(),
                    given_name: Some("Leul".to_string()),
                },
                &GoogleCredentials {
                    access_token: "ya29.token".to_string(),
                    refresh_token: None,
                    expires_at: i64::MAX / 2,
                },
            )
            .unwrap();

        let response = router(state)
            .oneshot(
                Request::builder()
                    .uri("/protected_area")
                    .header(header::COOKIE, format!("session={}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("Hello, Leul"));
        assert!(body.contains("/protected_area2"));
    }

    fn session_token(state: &AppState, expires_at: i64) -> String {
        state
            .sessions
            .issue(
                &UserProfile {
                    sub: "1234".to_string(),
                    name: "Leul Mekonnen".to_string(),
                    given_name: Some("Leul".to_string()),
                },
                &GoogleCredentials {
                    access_token: "ya29.stale".to_string(),
                    refresh_token: Some("1//refresh".to_string()),
                    expires_at,
                },
            )
            .unwrap()
    }

    fn generate_request(token: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/protected_area2")
            .header(header::COOKIE, format!("session={}", token))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("position=S"))
            .unwrap()
    }

    async fn mount_calendar(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/calendar/v3/calendars/primary/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{
                    "id": "evt1",
                    "summary": "Camp Leul M. (S 8.0)",
                    "location": "Roxbury, MA 02119",
                    "creator": { "email": "scheduler@example.com" },
                    "start": { "dateTime": "2025-08-04T09:00:00-04:00" }
                }]
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn expired_session_is_refreshed_before_generating() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.renewed",
                "expires_in": 3599
            })))
            .expect(1)
            .mount(&server)
            .await;
        mount_calendar(&server).await;
        Mock::given(method("GET"))
            .and(path("/drive/v3/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "files": [] })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v4/spreadsheets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "spreadsheetId": "sheet-123" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v4/spreadsheets/sheet-123/values:batchUpdate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v4/spreadsheets/sheet-123:batchUpdate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "replies": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let config = Config::for_target("scheduler@example.com", GoogleEndpoints::with_base(&server.uri()));
        let state = AppState::new(config, Arc::new(InMemoryJournal::default())).unwrap();
        let token = session_token(&state, 0);

        let response = router(state.clone())
            .oneshot(generate_request(&token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
        assert!(cookie.starts_with("session="));
        let reissued = cookie["session=".len()..].split(';').next().unwrap();
        let claims = state.sessions.validate(reissued).unwrap();
        assert_eq!(claims.access_token, "ya29.renewed");
        assert_eq!(claims.refresh_token.as_deref(), Some("1//refresh"));

        assert!(body_text(response)
            .await
            .contains("Your timesheet has been created in Google Sheets."));
    }

    #[tokio::test]
    async fn existing_timesheet_is_reported_without_new_cookie() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;
        mount_calendar(&server).await;
        Mock::given(method("GET"))
            .and(path("/drive/v3/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "files": [{ "id": "sheet-old", "name": "Leul Mekonnen Timesheet" }]
            })))
            .mount(&server)
            .await;

        let config = Config::for_target("scheduler@example.com", GoogleEndpoints::with_base(&server.uri()));
        let state = AppState::new(config, Arc::new(InMemoryJournal::default())).unwrap();
        let token = session_token(&state, i64::MAX / 2);

        let response = router(state).oneshot(generate_request(&token)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert!(body_text(response)
            .await
            .contains("Your timesheet for this month already exists."));
    }

    #[tokio::test]
    async fn generation_failure_is_a_bad_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendar/v3/calendars/primary/events"))
            .respond_with(ResponseTemplate::new(403).set_body_string("calendar access denied"))
            .mount(&server)
            .await;

        let config = Config::for_target("scheduler@example.com", GoogleEndpoints::with_base(&server.uri()));
        let state = AppState::new(config, Arc::new(InMemoryJournal::default())).unwrap();
        let token = session_token(&state, i64::MAX / 2);

        let response = router(state).oneshot(generate_request(&token)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(body_text(response).await.contains("HTTP 403"));
    }
}
