use crate::utils::time::SHEET_DATE_FORMAT;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position an employee works a shift in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    SummerTeacher,
    SummerManager,
    TeacherLead,
    TeacherAssistant,
    SpecialEvent,
    Unknown,
}

impl Position {
    /// Map the single-letter code chosen on the form
    pub fn from_code(code: &str) -> Self {
        match code {
            "S" => Position::SummerTeacher,
            "M" => Position::SummerManager,
            "L" => Position::TeacherLead,
            "A" => Position::TeacherAssistant,
            "E" => Position::SpecialEvent,
            _ => Position::Unknown,
        }
    }

    /// Label written to the POSITION column
    pub fn label(&self) -> &'static str {
        match self {
            Position::SummerTeacher => "Summer Teacher",
            Position::SummerManager => "Summer Manager",
            Position::TeacherLead => "Teacher - Lead",
            Position::TeacherAssistant => "Teacher - Assistant",
            Position::SpecialEvent => "Special Event",
            Position::Unknown => "Unknown Event",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One shift parsed from a calendar event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftRecord {
    pub date: NaiveDate,
    pub hours: f64,
    pub location: String,
    pub employee_name: String,
    pub position: Position,
}

impl ShiftRecord {
    /// Date as written to the sheet, `MM/DD/YYYY`
    pub fn sheet_date(&self) -> String {
        self.date.format(SHEET_DATE_FORMAT).to_string()
    }

    /// Hours as written to the sheet, always with one decimal place
    pub fn sheet_hours(&self) -> String {
        format!("{:.1}", self.hours)
    }
}
