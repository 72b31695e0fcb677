pub mod models;
pub mod parser;

pub use models::{Position, ShiftRecord};
pub use parser::{ParsedShift, ShiftGrammar, UnrecognizedReason};

use crate::components::google_calendar::{CalendarApi, CalendarEvent};
use crate::error::TimesheetResult;
use crate::utils::time::MonthWindow;
use tracing::{debug, info, warn};

/// An event from the scheduling account that could not be read as a shift
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEvent {
    pub event_id: String,
    pub summary: Option<String>,
    pub reason: UnrecognizedReason,
}

/// Shifts found in one month plus the events that were passed over
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionReport {
    pub records: Vec<ShiftRecord>,
    pub skipped: Vec<SkippedEvent>,
}

/// Turns calendar events booked by the scheduling account into shift records
#[derive(Debug, Clone)]
pub struct ShiftExtractor {
    target_email: String,
}

impl ShiftExtractor {
    pub fn new(target_email: &str) -> Self {
        Self {
            target_email: target_email.to_string(),
        }
    }

    /// Fetch the window's events and extract the employee's shifts
    pub async fn extract(
        &self,
        calendar: &dyn CalendarApi,
        window: &MonthWindow,
        first_name: &str,
        position_code: &str,
    ) -> TimesheetResult<ExtractionReport> {
        let events = calendar.list_events(window).await?;
        if events.is_empty() {
            info!("No events found between {} and {}", window.start, window.end);
            return Ok(ExtractionReport::default());
        }

        self.extract_from_events(&events, first_name, position_code)
    }

    /// Extract shifts from already fetched events, keeping their order
    pub fn extract_from_events(
        &self,
        events: &[CalendarEvent],
        first_name: &str,
        position_code: &str,
    ) -> TimesheetResult<ExtractionReport> {
        let grammar = ShiftGrammar::new(first_name)?;
        let position = Position::from_code(position_code);
        let mut report = ExtractionReport::default();

        for event in events.iter().filter(|event| self.is_from_target(event)) {
            match grammar.parse(event) {
                ParsedShift::Parsed(fields) => report.records.push(ShiftRecord {
                    date: fields.date,
                    hours: fields.hours,
                    location: fields.location,
                    employee_name: first_name.to_string(),
                    position,
                }),
                ParsedShift::Unrecognized(reason) => {
                    if matches!(reason, UnrecognizedReason::MissingDate(_)) {
                        debug!("Skipping event {}: {}", event.id, reason);
                    } else {
                        warn!("Skipping event {}: {}", event.id, reason);
                    }
                    report.skipped.push(SkippedEvent {
                        event_id: event.id.clone(),
                        summary: event.summary.clone(),
                        reason,
                    });
                }
            }
        }

        info!(
            "Extracted {} shifts for {} ({} events skipped)",
            report.records.len(),
            first_name,
            report.skipped.len()
        );
        Ok(report)
    }

    fn is_from_target(&self, event: &CalendarEvent) -> bool {
        event.sender_email().as_deref() == Some(self.target_email.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone, Utc};

    const TARGET: &str = "scheduler@example.com";

    fn event(id: &str, summary: &str, creator: &str, start: &str) -> CalendarEvent {
        CalendarEvent {
            id: id.to_string(),
            summary: Some(summary.to_string()),
            location: Some("Roxbury, MA 02119".to_string()),
            creator_email: Some(creator.to_string()),
            start_date_time: Some(start.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn target_event_becomes_a_record() {
        let extractor = ShiftExtractor::new(TARGET);
        let events = [event("e1", "Leul M. (S 8.0)", TARGET, "2025-08-04T09:00:00Z")];

        let report = extractor.extract_from_events(&events, "Leul", "S").unwrap();

        assert_eq!(report.records.len(), 1);
        let record = &report.records[0];
        assert_eq!(record.sheet_date(), "08/04/2025");
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2025, 8, 4).unwrap());
        assert_eq!(record.hours, 8.0);
        assert_eq!(record.location, "Roxbury");
        assert_eq!(record.employee_name, "Leul");
        assert_eq!(record.position.label(), "Summer Teacher");
    }

    #[test]
    fn creator_email_is_compared_case_insensitively() {
        let extractor = ShiftExtractor::new(TARGET);
        let events = [event("e1", "Leul M. (S 8.0)", "Scheduler@EXAMPLE.com", "2025-08-04")];

        let report = extractor.extract_from_events(&events, "Leul", "M").unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].position, Position::SummerManager);
    }

    #[test]
    fn other_senders_are_excluded_entirely() {
        let extractor = ShiftExtractor::new(TARGET);
        let events = [
            event("e1", "Leul M. (S 8.0)", "someone@example.com", "2025-08-04T09:00:00Z"),
            CalendarEvent {
                creator_email: None,
                ..event("e2", "Leul M. (S 6.0)", "", "2025-08-05T09:00:00Z")
            },
        ];

        let report = extractor.extract_from_events(&events, "Leul", "S").unwrap();
        assert!(report.records.is_empty());
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn malformed_event_does_not_block_the_month() {
        let extractor = ShiftExtractor::new(TARGET);
        let events = [
            event("e1", "Leul M. (S 8.0)", TARGET, "2025-08-04T09:00:00Z"),
            event("e2", "Team meeting", TARGET, "2025-08-05T09:00:00Z"),
            event("e3", "Leul M. (M 3.5)", TARGET, "2025-08-06T13:00:00Z"),
        ];

        let report = extractor.extract_from_events(&events, "Leul", "S").unwrap();

        let dates: Vec<String> = report.records.iter().map(|r| r.sheet_date()).collect();
        assert_eq!(dates, vec!["08/04/2025", "08/06/2025"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].event_id, "e2");
        assert!(matches!(
            report.skipped[0].reason,
            UnrecognizedReason::TitleMismatch(_)
        ));
    }

    struct FixedCalendar(Vec<CalendarEvent>);

    #[async_trait]
    impl CalendarApi for FixedCalendar {
        async fn list_events(&self, _window: &MonthWindow) -> TimesheetResult<Vec<CalendarEvent>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn empty_calendar_gives_empty_report() {
        let window = MonthWindow {
            start: Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap(),
        };
        let report = ShiftExtractor::new(TARGET)
            .extract(&FixedCalendar(Vec::new()), &window, "Leul", "S")
            .await
            .unwrap();
        assert_eq!(report, ExtractionReport::default());
    }
}
