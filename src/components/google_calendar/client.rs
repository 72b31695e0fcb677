use super::models::CalendarEvent;
use crate::components::google_auth::GoogleCredentials;
use crate::error::{google_api_error, TimesheetResult};
use crate::utils::http::read_json;
use crate::utils::time::MonthWindow;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Read access to a calendar's events
#[async_trait]
pub trait CalendarApi: Send + Sync {
    /// Single occurrences starting inside the window, ordered by start time
    async fn list_events(&self, window: &MonthWindow) -> TimesheetResult<Vec<CalendarEvent>>;
}

/// Google Calendar v3 client bound to one set of credentials
pub struct GoogleCalendarClient {
    client: Client,
    base_url: String,
    calendar_id: String,
    max_results: u32,
    access_token: String,
}

impl GoogleCalendarClient {
    pub fn new(
        client: Client,
        base_url: &str,
        calendar_id: &str,
        max_results: u32,
        credentials: &GoogleCredentials,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            calendar_id: calendar_id.to_string(),
            max_results,
            access_token: credentials.access_token.clone(),
        }
    }

    fn events_url(&self, window: &MonthWindow) -> TimesheetResult<Url> {
        let mut url = Url::parse(&format!("{}/calendars/", self.base_url))
            .map_err(|e| google_api_error(&format!("Failed to parse URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| google_api_error("Calendar base URL cannot hold a path"))?
            .pop_if_empty()
            .push(&self.calendar_id)
            .push("events");

        url.query_pairs_mut()
            .append_pair("timeMin", &window.start.to_rfc3339())
            .append_pair("timeMax", &window.end.to_rfc3339())
            .append_pair("maxResults", &self.max_results.to_string())
            .append_pair("singleEvents", "true")
            .append_pair("orderBy", "startTime");

        Ok(url)
    }
}

#[async_trait]
impl CalendarApi for GoogleCalendarClient {
    async fn list_events(&self, window: &MonthWindow) -> TimesheetResult<Vec<CalendarEvent>> {
        let url = self.events_url(window)?;
        debug!("Fetching calendar events from {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| google_api_error(&format!("Failed to fetch events: {}", e)))?;

        let response_data: Value = read_json(response, "Failed to fetch events").await?;

        // An empty calendar omits `items` entirely
        let events = match response_data.get("items").and_then(|i| i.as_array()) {
            Some(items) => items.iter().map(event_from_json).collect(),
            None => Vec::new(),
        };

        Ok(events)
    }
}

/// Convert one `items[]` entry of the events list response
pub fn event_from_json(event: &Value) -> CalendarEvent {
    let text = |value: Option<&Value>| value.and_then(|v| v.as_str()).map(|s| s.to_string());

    let start = event.get("start").and_then(|start| start.as_object());

    CalendarEvent {
        id: text(event.get("id")).unwrap_or_default(),
        summary: text(event.get("summary")),
        location: text(event.get("location")),
        creator_email: text(event.get("creator").and_then(|c| c.get("email"))),
        organizer_email: text(event.get("organizer").and_then(|o| o.get("email"))),
        start_date_time: text(start.and_then(|s| s.get("dateTime"))),
        start_date: text(start.and_then(|s| s.get("date"))),
    }
}
