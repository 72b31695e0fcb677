use crate::error::{Error, TimesheetResult};
use chrono::{DateTime, Datelike, Month, NaiveDate, TimeZone, Utc};

#[cfg(feature = "legacy-month-rollover")]
use chrono::Timelike;

/// Format used for dates written to the timesheet
pub const SHEET_DATE_FORMAT: &str = "%m/%d/%Y";

/// Format of dates embedded in calendar timestamps
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Half-open time range `[start, end)` covering one calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Compute the window from the first day of `now`'s month to the first day of the next month
#[cfg(not(feature = "legacy-month-rollover"))]
pub fn month_window(now: DateTime<Utc>) -> TimesheetResult<MonthWindow> {
    let start = first_of_month(now.year(), now.month())?;
    let (next_year, next_month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };
    let end = first_of_month(next_year, next_month)?;

    Ok(MonthWindow { start, end })
}

/// Compute the window the way the first release did: the lower bound keeps the
/// time of day and the upper bound uses `(month + 1) % 12` in the same year
#[cfg(feature = "legacy-month-rollover")]
pub fn month_window(now: DateTime<Utc>) -> TimesheetResult<MonthWindow> {
    let start = Utc
        .with_ymd_and_hms(now.year(), now.month(), 1, now.hour(), now.minute(), now.second())
        .single()
        .ok_or_else(|| Error::InvalidMonthWindow(format!("no first day for {}", now)))?;

    let next_month = (now.month() + 1) % 12;
    if next_month == 0 {
        return Err(Error::InvalidMonthWindow(format!(
            "month index 0 computed for {}-{:02}",
            now.year(),
            now.month()
        )));
    }
    let end = first_of_month(now.year(), next_month)?;
    if end <= start {
        tracing::warn!("Legacy month window is empty: {} .. {}", start, end);
    }

    Ok(MonthWindow { start, end })
}

fn first_of_month(year: i32, month: u32) -> TimesheetResult<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| Error::InvalidMonthWindow(format!("{}-{:02} is not a valid month", year, month)))
}

/// English month name for a 1-based month number
pub fn month_name(month: u32) -> Option<&'static str> {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
}

/// Deterministic spreadsheet title, e.g. "Leul Mekonnen Timesheet August 2025"
pub fn sheet_title(full_name: &str, now: DateTime<Utc>) -> String {
    let month = month_name(now.month()).unwrap_or("Unknown");
    format!("{} Timesheet {} {}", full_name, month, now.year())
}

/// Convert `2025-08-04` into `08/04/2025`
pub fn iso_to_sheet_date(iso_date: &str) -> Option<String> {
    NaiveDate::parse_from_str(iso_date, ISO_DATE_FORMAT)
        .ok()
        .map(|date| date.format(SHEET_DATE_FORMAT).to_string())
}

/// Convert `08/04/2025` back into `2025-08-04`
pub fn sheet_to_iso_date(sheet_date: &str) -> Option<String> {
    NaiveDate::parse_from_str(sheet_date, SHEET_DATE_FORMAT)
        .ok()
        .map(|date| date.format(ISO_DATE_FORMAT).to_string())
}
