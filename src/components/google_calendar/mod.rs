pub mod client;
pub mod models;

pub use client::{CalendarApi, GoogleCalendarClient};
pub use models::CalendarEvent;
