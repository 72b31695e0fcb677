use crate::components::google_auth::{first_name_of, GoogleCredentials};
use crate::components::google_calendar::{CalendarApi, GoogleCalendarClient};
use crate::components::sheets::{
    GoogleSheetsClient, InMemoryJournal, ProvisionJournal, ProvisionOutcome, RedisJournal, RowLabels,
    SheetProvisioner, SpreadsheetApi,
};
use crate::components::shift_extractor::ShiftExtractor;
use crate::config::Config;
use crate::error::TimesheetResult;
use crate::utils::time::{month_window, sheet_title};
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::sync::Arc;
use tracing::{error, info};

/// Who the timesheet is for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimesheetRequest {
    pub full_name: String,
    pub position_code: String,
}

/// Runs extraction then provisioning for one employee and month
pub struct TimesheetService {
    config: Arc<Config>,
    client: Client,
    extractor: ShiftExtractor,
    provisioner: SheetProvisioner,
}

impl TimesheetService {
    pub fn new(config: Arc<Config>, client: Client, journal: Arc<dyn ProvisionJournal>) -> Self {
        let extractor = ShiftExtractor::new(&config.target_email);
        let provisioner = SheetProvisioner::new(
            journal,
            RowLabels::from_legacy_flag(config.legacy_position_label),
        );
        Self {
            config,
            client,
            extractor,
            provisioner,
        }
    }

    /// Generate the current month's timesheet using the caller's credentials
    pub async fn generate(
        &self,
        credentials: &GoogleCredentials,
        request: &TimesheetRequest,
    ) -> TimesheetResult<ProvisionOutcome> {
        let endpoints = &self.config.endpoints;
        let calendar = GoogleCalendarClient::new(
            self.client.clone(),
            &endpoints.calendar_base,
            &self.config.calendar_id,
            self.config.max_results,
            credentials,
        );
        let sheets = GoogleSheetsClient::new(
            self.client.clone(),
            &endpoints.drive_base,
            &endpoints.sheets_base,
            credentials,
        );

        self.generate_with(&calendar, &sheets, request, Utc::now())
            .await
    }

    /// Generate the timesheet for the month containing `now`
    pub async fn generate_with(
        &self,
        calendar: &dyn CalendarApi,
        sheets: &dyn SpreadsheetApi,
        request: &TimesheetRequest,
        now: DateTime<Utc>,
    ) -> TimesheetResult<ProvisionOutcome> {
        let first_name = first_name_of(&request.full_name);
        let window = month_window(now)?;
        let title = sheet_title(&request.full_name, now);
        info!("Generating '{}'", title);

        let report = self
            .extractor
            .extract(calendar, &window, first_name, &request.position_code)
            .await
            .inspect_err(|e| error!("Failed to read shifts for '{}': {}", title, e))?;

        let outcome = self
            .provisioner
            .provision(sheets, &title, &request.full_name, &report.records)
            .await?;
        info!("'{}' done: {:?}", title, outcome);
        Ok(outcome)
    }
}

/// Redis journal when configured and reachable, in-memory otherwise
pub async fn journal_from_config(config: &Config) -> Arc<dyn ProvisionJournal> {
    let Some(redis_url) = config.redis_url.as_deref() else {
        info!("REDIS_URL not set, using in-memory provisioning journal");
        return Arc::new(InMemoryJournal::default());
    };

    match RedisJournal::connect(redis_url).await {
        Ok(journal) => {
            info!("Connected to Redis successfully");
            Arc::new(journal)
        }
        Err(e) => {
            error!("Failed to connect to Redis: {}", e);
            info!("Using in-memory provisioning journal as fallback");
            Arc::new(InMemoryJournal::default())
        }
    }
}
