/// Simplified calendar event representation
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default, PartialEq, Eq)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: Option<String>,
    pub location: Option<String>,
    pub creator_email: Option<String>,
    pub organizer_email: Option<String>,
    pub start_date_time: Option<String>,
    pub start_date: Option<String>,
}

impl CalendarEvent {
    /// Raw start: the timed `dateTime` if present, otherwise the all-day `date`
    pub fn start(&self) -> Option<&str> {
        self.start_date_time
            .as_deref()
            .or(self.start_date.as_deref())
    }

    /// Email of the account that put the event on the calendar, lower-cased
    pub fn sender_email(&self) -> Option<String> {
        self.creator_email
            .as_deref()
            .or(self.organizer_email.as_deref())
            .map(str::to_lowercase)
    }
}
