use super::layout::ValueRange;
use crate::components::google_auth::GoogleCredentials;
use crate::error::{google_api_error, TimesheetResult};
use crate::utils::http::{ensure_success, read_json};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

/// MIME type Drive uses for Google Sheets files
pub const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

/// A spreadsheet file as listed by Drive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadsheetFile {
    pub id: String,
    pub name: String,
}

/// Remote operations the provisioner needs from Sheets and Drive
#[async_trait]
pub trait SpreadsheetApi: Send + Sync {
    /// Non-trashed spreadsheet whose name equals `title` exactly
    async fn find_by_title(&self, title: &str) -> TimesheetResult<Option<SpreadsheetFile>>;

    /// Create an empty spreadsheet and return its id
    async fn create(&self, title: &str) -> TimesheetResult<String>;

    /// Write cell values in one `values:batchUpdate` call
    async fn write_values(&self, spreadsheet_id: &str, data: &[ValueRange]) -> TimesheetResult<()>;

    /// Apply structural requests in one `batchUpdate` call
    async fn apply_requests(&self, spreadsheet_id: &str, requests: &[Value]) -> TimesheetResult<()>;
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<SpreadsheetFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedSpreadsheet {
    spreadsheet_id: String,
}

/// Sheets v4 and Drive v3 client bound to one set of credentials
pub struct GoogleSheetsClient {
    client: Client,
    drive_base: String,
    sheets_base: String,
    access_token: String,
}

impl GoogleSheetsClient {
    pub fn new(client: Client, drive_base: &str, sheets_base: &str, credentials: &GoogleCredentials) -> Self {
        Self {
            client,
            drive_base: drive_base.trim_end_matches('/').to_string(),
            sheets_base: sheets_base.trim_end_matches('/').to_string(),
            access_token: credentials.access_token.clone(),
        }
    }
}

/// Drive search expression for a spreadsheet title
pub fn title_query(title: &str) -> String {
    let escaped = title.replace('\\', "\\\\").replace('\'', "\\'");
    format!(
        "name='{}' and mimeType='{}' and trashed=false",
        escaped, SPREADSHEET_MIME_TYPE
    )
}

#[async_trait]
impl SpreadsheetApi for GoogleSheetsClient {
    async fn find_by_title(&self, title: &str) -> TimesheetResult<Option<SpreadsheetFile>> {
        let query = title_query(title);
        debug!("Searching Drive with q={}", query);

        let response = self
            .client
            .get(format!("{}/files", self.drive_base))
            .bearer_auth(&self.access_token)
            .query(&[
                ("q", query.as_str()),
                ("pageSize", "1"),
                ("fields", "files(id, name)"),
            ])
            .send()
            .await
            .map_err(|e| google_api_error(&format!("Failed to search Drive: {}", e)))?;

        let list: FileList = read_json(response, "Failed to search Drive").await?;
        Ok(list.files.into_iter().next())
    }

    async fn create(&self, title: &str) -> TimesheetResult<String> {
        let body = json!({ "properties": { "title": title } });

        let response = self
            .client
            .post(format!("{}/spreadsheets", self.sheets_base))
            .bearer_auth(&self.access_token)
            .query(&[("fields", "spreadsheetId")])
            .json(&body)
            .send()
            .await
            .map_err(|e| google_api_error(&format!("Failed to create spreadsheet: {}", e)))?;

        let created: CreatedSpreadsheet = read_json(response, "Failed to create spreadsheet").await?;
        Ok(created.spreadsheet_id)
    }

    async fn write_values(&self, spreadsheet_id: &str, data: &[ValueRange]) -> TimesheetResult<()> {
        let body = json!({
            "valueInputOption": "USER_ENTERED",
            "data": data,
        });

        let response = self
            .client
            .post(format!(
                "{}/spreadsheets/{}/values:batchUpdate",
                self.sheets_base, spreadsheet_id
            ))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| google_api_error(&format!("Failed to write values: {}", e)))?;

        ensure_success(response, "Failed to write values").await?;
        Ok(())
    }

    async fn apply_requests(&self, spreadsheet_id: &str, requests: &[Value]) -> TimesheetResult<()> {
        let body = json!({ "requests": requests });

        let response = self
            .client
            .post(format!(
                "{}/spreadsheets/{}:batchUpdate",
                self.sheets_base, spreadsheet_id
            ))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| google_api_error(&format!("Failed to format spreadsheet: {}", e)))?;

        ensure_success(response, "Failed to format spreadsheet").await?;
        Ok(())
    }
}
