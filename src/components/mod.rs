// Export components
pub mod google_auth;
pub mod google_calendar;
pub mod sheets;
pub mod shift_extractor;
pub mod timesheet;

pub use timesheet::{TimesheetRequest, TimesheetService};
