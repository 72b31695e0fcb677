//! Fixed layout of a monthly timesheet.
//!
//! ```text
//!      A         B        C          D          E   F          G
//!  2             Staff Member:  <full name>
//!  3   DATE      HOURS    LOCATION   POSITION       Totals
//!  4   <shift rows ...>                              =SUMIF     Back Office
//!  ..                                                ...        ...
//! 13                                                 =SUMIF     Teacher - Online Class
//! ```

use crate::components::shift_extractor::{Position, ShiftRecord};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Name of the default sheet of a new spreadsheet
pub const SHEET_NAME: &str = "Sheet1";

/// Id of the default sheet of a new spreadsheet
pub const SHEET_ID: i64 = 0;

/// First row holding shift data
pub const FIRST_SHIFT_ROW: usize = 4;

/// Every position the POSITION column accepts, in totals-box order
pub const POSITION_LABELS: [&str; 10] = [
    "Back Office",
    "ISFT Assistant",
    "ISFT Lead",
    "PSS",
    "Special Event",
    "Summer Manager",
    "Summer Teacher",
    "Teacher - Assistant",
    "Teacher - Lead",
    "Teacher - Online Class",
];

/// Label every row carried in the first release
pub const LEGACY_ROW_LABEL: &str = "Summer Teacher";

/// Grey of the totals box, rgb(191, 191, 191)
const TOTALS_GREY: f64 = 191.0 / 255.0;

/// One entry of a `values:batchUpdate` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    pub range: String,
    pub major_dimension: String,
    pub values: Vec<Vec<String>>,
}

impl ValueRange {
    fn rows(range: String, values: Vec<Vec<String>>) -> Self {
        Self {
            range,
            major_dimension: "ROWS".to_string(),
            values,
        }
    }

    fn cell(range: &str, value: &str) -> Self {
        Self::rows(format!("{}!{}", SHEET_NAME, range), vec![vec![value.to_string()]])
    }
}

/// How the POSITION column of shift rows is filled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLabels {
    /// The record's own position
    FromRecord,
    /// "Summer Teacher" on every row
    Legacy,
}

impl RowLabels {
    pub fn from_legacy_flag(legacy: bool) -> Self {
        if legacy {
            RowLabels::Legacy
        } else {
            RowLabels::FromRecord
        }
    }

    fn label(self, position: Position) -> &'static str {
        match self {
            RowLabels::FromRecord => position.label(),
            RowLabels::Legacy => LEGACY_ROW_LABEL,
        }
    }
}

/// Header cells, column titles and the totals box
pub fn boilerplate(full_name: &str) -> Vec<ValueRange> {
    let last_total_row = FIRST_SHIFT_ROW + POSITION_LABELS.len() - 1;
    let totals = POSITION_LABELS
        .iter()
        .enumerate()
        .map(|(offset, label)| {
            let row = FIRST_SHIFT_ROW + offset;
            vec![
                format!("=ARRAY_CONSTRAIN(ARRAYFORMULA(SUMIF($D:D, $G{}, $B:B)), 1, 1)", row),
                label.to_string(),
            ]
        })
        .collect();

    vec![
        ValueRange::cell("B2", "Staff Member:"),
        ValueRange::cell("C2", full_name),
        ValueRange::rows(
            format!("{}!A3:D3", SHEET_NAME),
            vec![vec![
                "DATE".to_string(),
                "HOURS".to_string(),
                "LOCATION".to_string(),
                "POSITION".to_string(),
            ]],
        ),
        ValueRange::cell("F3", "Totals"),
        ValueRange::rows(
            format!("{}!F{}:G{}", SHEET_NAME, FIRST_SHIFT_ROW, last_total_row),
            totals,
        ),
    ]
}

/// One row per shift, starting at row 4, columns A–D
pub fn shift_rows(records: &[ShiftRecord], labels: RowLabels) -> Vec<ValueRange> {
    records
        .iter()
        .enumerate()
        .map(|(offset, record)| {
            let row = FIRST_SHIFT_ROW + offset;
            ValueRange::rows(
                format!("{}!A{}:{}", SHEET_NAME, row, row),
                vec![vec![
                    record.sheet_date(),
                    record.sheet_hours(),
                    record.location.clone(),
                    labels.label(record.position).to_string(),
                ]],
            )
        })
        .collect()
}

fn repeat_cell(range: Value, format: Value, fields: &str) -> Value {
    json!({
        "repeatCell": {
            "range": range,
            "cell": { "userEnteredFormat": format },
            "fields": fields,
        }
    })
}

fn font(size: u32) -> Value {
    json!({ "textFormat": { "fontFamily": "Calibri", "fontSize": size } })
}

fn grey() -> Value {
    json!({ "red": TOTALS_GREY, "green": TOTALS_GREY, "blue": TOTALS_GREY })
}

/// Alignment, fonts, widths, number formats, the totals box and the POSITION dropdown
pub fn formatting_requests(sheet_id: i64) -> Vec<Value> {
    const FONT_FIELDS: &str = "userEnteredFormat.textFormat.fontFamily,userEnteredFormat.textFormat.fontSize";

    let totals_box = json!({
        "sheetId": sheet_id,
        "startRowIndex": 2,
        "endRowIndex": 13,
        "startColumnIndex": 5,
        "endColumnIndex": 8
    });
    let solid_grey = json!({ "style": "SOLID", "color": grey() });
    let dropdown_values: Vec<Value> = POSITION_LABELS
        .iter()
        .map(|label| json!({ "userEnteredValue": label }))
        .collect();

    vec![
        repeat_cell(
            json!({ "sheetId": sheet_id, "startRowIndex": 0 }),
            json!({ "horizontalAlignment": "CENTER" }),
            "userEnteredFormat.horizontalAlignment",
        ),
        repeat_cell(
            json!({ "sheetId": sheet_id, "startColumnIndex": 6, "endColumnIndex": 29 }),
            json!({ "horizontalAlignment": "LEFT" }),
            "userEnteredFormat.horizontalAlignment",
        ),
        repeat_cell(
            json!({
                "sheetId": sheet_id,
                "startRowIndex": 1,
                "endRowIndex": 3,
                "startColumnIndex": 0,
                "endColumnIndex": 6
            }),
            font(12),
            FONT_FIELDS,
        ),
        repeat_cell(
            json!({ "sheetId": sheet_id, "startRowIndex": 3, "startColumnIndex": 5, "endColumnIndex": 7 }),
            font(12),
            FONT_FIELDS,
        ),
        repeat_cell(
            json!({ "sheetId": sheet_id, "startRowIndex": 3, "startColumnIndex": 0, "endColumnIndex": 4 }),
            font(11),
            FONT_FIELDS,
        ),
        repeat_cell(
            json!({
                "sheetId": sheet_id,
                "startRowIndex": 1,
                "endRowIndex": 2,
                "startColumnIndex": 1,
                "endColumnIndex": 2
            }),
            json!({ "textFormat": { "bold": true } }),
            "userEnteredFormat.textFormat.bold",
        ),
        repeat_cell(
            json!({
                "sheetId": sheet_id,
                "startRowIndex": 2,
                "endRowIndex": 3,
                "startColumnIndex": 0,
                "endColumnIndex": 6
            }),
            json!({ "textFormat": { "bold": true } }),
            "userEnteredFormat.textFormat.bold",
        ),
        // LOCATION and POSITION
        json!({
            "updateDimensionProperties": {
                "range": { "sheetId": sheet_id, "dimension": "COLUMNS", "startIndex": 2, "endIndex": 4 },
                "properties": { "pixelSize": 194 },
                "fields": "pixelSize"
            }
        }),
        repeat_cell(
            json!({ "sheetId": sheet_id, "startRowIndex": 3, "startColumnIndex": 1, "endColumnIndex": 2 }),
            json!({ "numberFormat": { "type": "NUMBER", "pattern": "#.0#" } }),
            "userEnteredFormat.numberFormat",
        ),
        repeat_cell(
            json!({ "sheetId": sheet_id, "startRowIndex": 3, "startColumnIndex": 0, "endColumnIndex": 1 }),
            json!({ "numberFormat": { "type": "DATE", "pattern": "m/d/yyy" } }),
            "userEnteredFormat.numberFormat",
        ),
        repeat_cell(
            totals_box.clone(),
            json!({ "backgroundColor": grey() }),
            "userEnteredFormat.backgroundColor",
        ),
        // Borders in the background colour make the box read as one merged cell
        repeat_cell(
            totals_box,
            json!({
                "borders": {
                    "top": solid_grey.clone(),
                    "bottom": solid_grey.clone(),
                    "left": solid_grey.clone(),
                    "right": solid_grey
                }
            }),
            "userEnteredFormat.borders",
        ),
        json!({
            "setDataValidation": {
                "range": { "sheetId": sheet_id, "startRowIndex": 3, "startColumnIndex": 3, "endColumnIndex": 4 },
                "rule": {
                    "condition": { "type": "ONE_OF_LIST", "values": dropdown_values },
                    "showCustomUi": true,
                    "strict": true
                }
            }
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(day: u32, position: Position) -> ShiftRecord {
        ShiftRecord {
            date: NaiveDate::from_ymd_opt(2025, 8, day).unwrap(),
            hours: 8.0,
            location: "Roxbury".to_string(),
            employee_name: "Leul".to_string(),
            position,
        }
    }

    #[test]
    fn boilerplate_has_headers_and_ten_totals() {
        let ranges = boilerplate("Leul Mekonnen");

        assert_eq!(ranges[0].range, "Sheet1!B2");
        assert_eq!(ranges[0].values, vec![vec!["Staff Member:".to_string()]]);
        assert_eq!(ranges[1].values, vec![vec!["Leul Mekonnen".to_string()]]);
        assert_eq!(ranges[2].values[0], vec!["DATE", "HOURS", "LOCATION", "POSITION"]);
        assert_eq!(ranges[3].range, "Sheet1!F3");

        let totals = &ranges[4];
        assert_eq!(totals.range, "Sheet1!F4:G13");
        assert_eq!(totals.values.len(), 10);
        assert_eq!(
            totals.values[0],
            vec![
                "=ARRAY_CONSTRAIN(ARRAYFORMULA(SUMIF($D:D, $G4, $B:B)), 1, 1)".to_string(),
                "Back Office".to_string()
            ]
        );
        assert_eq!(totals.values[9][1], "Teacher - Online Class");
        assert!(totals.values[9][0].contains("$G13"));
    }

    #[test]
    fn shift_rows_start_at_row_four() {
        let rows = shift_rows(
            &[record(4, Position::TeacherLead), record(5, Position::TeacherLead)],
            RowLabels::FromRecord,
        );

        assert_eq!(rows[0].range, "Sheet1!A4:4");
        assert_eq!(rows[1].range, "Sheet1!A5:5");
        assert_eq!(rows[0].values[0], vec!["08/04/2025", "8.0", "Roxbury", "Teacher - Lead"]);
    }

    #[test]
    fn legacy_rows_always_say_summer_teacher() {
        let rows = shift_rows(&[record(4, Position::SpecialEvent)], RowLabels::Legacy);
        assert_eq!(rows[0].values[0][3], "Summer Teacher");
    }

    #[test]
    fn formatting_ends_with_strict_dropdown() {
        let requests = formatting_requests(SHEET_ID);
        assert_eq!(requests.len(), 13);

        let rule = &requests[12]["setDataValidation"]["rule"];
        assert_eq!(rule["strict"], json!(true));
        assert_eq!(rule["condition"]["type"], "ONE_OF_LIST");
        let values = rule["condition"]["values"].as_array().unwrap();
        assert_eq!(values.len(), POSITION_LABELS.len());
        assert_eq!(values[6]["userEnteredValue"], "Summer Teacher");
    }

    #[test]
    fn value_ranges_serialize_in_api_shape() {
        let json = serde_json::to_value(ValueRange::cell("F3", "Totals")).unwrap();
        assert_eq!(
            json,
            json!({ "range": "Sheet1!F3", "majorDimension": "ROWS", "values": [["Totals"]] })
        );
    }
}
