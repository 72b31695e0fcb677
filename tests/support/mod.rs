#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use shiftsheet::components::google_calendar::{CalendarApi, CalendarEvent};
use shiftsheet::components::sheets::{SpreadsheetApi, SpreadsheetFile, ValueRange};
use shiftsheet::error::{google_api_error, TimesheetResult};
use shiftsheet::utils::time::MonthWindow;
use std::sync::Mutex;

pub const TARGET_EMAIL: &str = "scheduler@example.com";

/// Remote call seen by the mock
#[derive(Debug, Clone, PartialEq)]
pub enum SheetCall {
    Find(String),
    Create(String),
    WriteValues(String, Vec<ValueRange>),
    ApplyRequests(String, usize),
}

#[derive(Debug, Default)]
struct MockState {
    files: Vec<SpreadsheetFile>,
    calls: Vec<SheetCall>,
    fail_on: Option<&'static str>,
}

/// In-memory stand-in for Sheets and Drive
#[derive(Debug, Default)]
pub struct MockSheets {
    state: Mutex<MockState>,
}

impl MockSheets {
    pub fn new() -> Self {
        Self::default()
    }

    /// A spreadsheet that already exists in Drive
    pub fn with_file(id: &str, name: &str) -> Self {
        let mock = Self::default();
        mock.state.lock().unwrap().files.push(SpreadsheetFile {
            id: id.to_string(),
            name: name.to_string(),
        });
        mock
    }

    /// Make every call of one kind ("create", "write_values", "apply_requests") fail
    pub fn fail_on(&self, operation: &'static str) {
        self.state.lock().unwrap().fail_on = Some(operation);
    }

    pub fn recover(&self) {
        self.state.lock().unwrap().fail_on = None;
    }

    pub fn calls(&self) -> Vec<SheetCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn files(&self) -> Vec<SpreadsheetFile> {
        self.state.lock().unwrap().files.clone()
    }

    /// Every value range written so far
    pub fn written_ranges(&self) -> Vec<ValueRange> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SheetCall::WriteValues(_, data) => Some(data),
                _ => None,
            })
            .flatten()
            .collect()
    }

    fn check(&self, operation: &'static str) -> TimesheetResult<()> {
        if self.state.lock().unwrap().fail_on == Some(operation) {
            return Err(google_api_error(&format!("{}: HTTP 503 - backend unavailable", operation)));
        }
        Ok(())
    }
}

#[async_trait]
impl SpreadsheetApi for MockSheets {
    async fn find_by_title(&self, title: &str) -> TimesheetResult<Option<SpreadsheetFile>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(SheetCall::Find(title.to_string()));
        Ok(state.files.iter().find(|f| f.name == title).cloned())
    }

    async fn create(&self, title: &str) -> TimesheetResult<String> {
        self.check("create")?;
        let mut state = self.state.lock().unwrap();
        state.calls.push(SheetCall::Create(title.to_string()));
        let id = format!("sheet-{}", state.files.len() + 1);
        state.files.push(SpreadsheetFile {
            id: id.clone(),
            name: title.to_string(),
        });
        Ok(id)
    }

    async fn write_values(&self, spreadsheet_id: &str, data: &[ValueRange]) -> TimesheetResult<()> {
        self.check("write_values")?;
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(SheetCall::WriteValues(spreadsheet_id.to_string(), data.to_vec()));
        Ok(())
    }

    async fn apply_requests(&self, spreadsheet_id: &str, requests: &[Value]) -> TimesheetResult<()> {
        self.check("apply_requests")?;
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(SheetCall::ApplyRequests(spreadsheet_id.to_string(), requests.len()));
        Ok(())
    }
}

/// Sheets backend that never answers
#[derive(Debug, Default)]
pub struct HangingSheets;

#[async_trait]
impl SpreadsheetApi for HangingSheets {
    async fn find_by_title(&self, _title: &str) -> TimesheetResult<Option<SpreadsheetFile>> {
        std::future::pending().await
    }

    async fn create(&self, _title: &str) -> TimesheetResult<String> {
        std::future::pending().await
    }

    async fn write_values(&self, _spreadsheet_id: &str, _data: &[ValueRange]) -> TimesheetResult<()> {
        std::future::pending().await
    }

    async fn apply_requests(&self, _spreadsheet_id: &str, _requests: &[Value]) -> TimesheetResult<()> {
        std::future::pending().await
    }
}

/// Calendar returning a fixed list of events
#[derive(Debug, Clone, Default)]
pub struct MockCalendar {
    pub events: Vec<CalendarEvent>,
}

#[async_trait]
impl CalendarApi for MockCalendar {
    async fn list_events(&self, _window: &MonthWindow) -> TimesheetResult<Vec<CalendarEvent>> {
        Ok(self.events.clone())
    }
}

/// A shift event as the scheduling account books it
pub fn shift_event(id: &str, summary: &str, creator: &str, start: &str) -> CalendarEvent {
    CalendarEvent {
        id: id.to_string(),
        summary: Some(summary.to_string()),
        location: Some("Roxbury, MA 02119".to_string()),
        creator_email: Some(creator.to_string()),
        start_date_time: Some(start.to_string()),
        ..Default::default()
    }
}
