//! Grammar for the shift text the scheduling account writes into events.
//!
//! A shift event looks like:
//!
//! ```text
//! start:    2025-08-04T09:00:00-04:00   (or the all-day form 2025-08-04)
//! title:    ... Leul M. (S 8.0) ...
//! location: Roxbury, MA 02119
//! ```
//!
//! The title fragment is `<first name> <initial>. (<M|S> <d>.<d>)`, the
//! location is everything before the first comma.

use crate::components::google_calendar::CalendarEvent;
use crate::error::TimesheetResult;
use crate::utils::time::ISO_DATE_FORMAT;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref DATE_RE: Regex = Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap();
    static ref LOCATION_RE: Regex = Regex::new(r"^(.+?),").unwrap();
}

/// Fields read out of one shift event
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftFields {
    pub date: NaiveDate,
    pub initial: char,
    /// Letter the scheduler put inside the parentheses (`M` or `S`)
    pub title_code: char,
    pub hours: f64,
    pub location: String,
}

/// Why an event could not be read as a shift
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnrecognizedReason {
    #[error("event has no start time")]
    MissingStart,
    #[error("no YYYY-MM-DD date in start '{0}'")]
    MissingDate(String),
    #[error("'{0}' is not a calendar date")]
    InvalidDate(String),
    #[error("event has no title")]
    MissingTitle,
    #[error("title '{0}' does not contain '<name> <initial>. (<M|S> <d>.<d>)'")]
    TitleMismatch(String),
    #[error("event has no location")]
    MissingLocation,
    #[error("location '{0}' has no text before a comma")]
    LocationMismatch(String),
}

/// Result of reading one event
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedShift {
    Parsed(ShiftFields),
    Unrecognized(UnrecognizedReason),
}

/// Shift grammar bound to one employee's first name
#[derive(Debug, Clone)]
pub struct ShiftGrammar {
    title_re: Regex,
}

impl ShiftGrammar {
    pub fn new(first_name: &str) -> TimesheetResult<Self> {
        let pattern = format!(
            r"{}\s([A-Z])\.\s\((M|S)\s(\d\.\d)\)",
            regex::escape(first_name)
        );
        Ok(Self {
            title_re: Regex::new(&pattern)?,
        })
    }

    /// Read an event's start, title and location
    pub fn parse(&self, event: &CalendarEvent) -> ParsedShift {
        match self.parse_fields(event) {
            Ok(fields) => ParsedShift::Parsed(fields),
            Err(reason) => ParsedShift::Unrecognized(reason),
        }
    }

    fn parse_fields(&self, event: &CalendarEvent) -> Result<ShiftFields, UnrecognizedReason> {
        let title = event.summary.as_deref().ok_or(UnrecognizedReason::MissingTitle)?;
        let (initial, title_code, hours) = self.parse_title(title)?;

        let location = event.location.as_deref().ok_or(UnrecognizedReason::MissingLocation)?;
        let location = parse_location(location)?;

        let start = event.start().ok_or(UnrecognizedReason::MissingStart)?;
        let date = parse_date(start)?;

        Ok(ShiftFields {
            date,
            initial,
            title_code,
            hours,
            location,
        })
    }

    /// Pull initial, code and hours out of the title
    pub fn parse_title(&self, title: &str) -> Result<(char, char, f64), UnrecognizedReason> {
        let mismatch = || UnrecognizedReason::TitleMismatch(title.to_string());
        let caps = self.title_re.captures(title).ok_or_else(mismatch)?;

        let initial = caps[1].chars().next().ok_or_else(mismatch)?;
        let title_code = caps[2].chars().next().ok_or_else(mismatch)?;
        let hours = caps[3].parse::<f64>().map_err(|_| mismatch())?;

        Ok((initial, title_code, hours))
    }
}

/// First `YYYY-MM-DD` in a start timestamp
pub fn parse_date(start: &str) -> Result<NaiveDate, UnrecognizedReason> {
    let found = DATE_RE
        .find(start)
        .ok_or_else(|| UnrecognizedReason::MissingDate(start.to_string()))?;
    NaiveDate::parse_from_str(found.as_str(), ISO_DATE_FORMAT)
        .map_err(|_| UnrecognizedReason::InvalidDate(found.as_str().to_string()))
}

/// Text before the first comma, trimmed
pub fn parse_location(location: &str) -> Result<String, UnrecognizedReason> {
    let mismatch = || UnrecognizedReason::LocationMismatch(location.to_string());
    let caps = LOCATION_RE.captures(location).ok_or_else(mismatch)?;
    let label = caps[1].trim();
    if label.is_empty() {
        return Err(mismatch());
    }
    Ok(label.to_string())
}
