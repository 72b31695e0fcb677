use super::client::SpreadsheetApi;
use super::journal::{JournalEntry, ProvisionJournal, ProvisionStage};
use super::layout::{self, RowLabels, SHEET_ID};
use crate::components::shift_extractor::ShiftRecord;
use crate::error::TimesheetResult;
use std::sync::Arc;
use tracing::{error, info, warn};

/// What a provisioning run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// A new spreadsheet was created and fully populated
    Created { spreadsheet_id: String },
    /// An interrupted earlier run was completed
    Resumed {
        spreadsheet_id: String,
        from: ProvisionStage,
    },
    /// The spreadsheet already existed and was left untouched
    AlreadyExists { spreadsheet_id: String },
    /// Another run is provisioning the same title right now
    Busy,
}

/// Holds a title's claim; releases it even when the run is cancelled
struct ClaimGuard {
    journal: Arc<dyn ProvisionJournal>,
    title: String,
    token: String,
    armed: bool,
}

impl ClaimGuard {
    async fn release(mut self) {
        self.armed = false;
        if let Err(e) = self.journal.release(&self.title, &self.token).await {
            error!("Failed to release claim on '{}': {}", self.title, e);
        }
    }
}

impl Drop for ClaimGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        warn!("Provisioning '{}' was cancelled, releasing its claim", self.title);
        let journal = Arc::clone(&self.journal);
        let title = std::mem::take(&mut self.title);
        let token = std::mem::take(&mut self.token);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = journal.release(&title, &token).await {
                        error!("Failed to release claim on '{}': {}", title, e);
                    }
                });
            }
            Err(_) => warn!("No runtime to release the claim on '{}', it will expire", title),
        }
    }
}

/// Creates, fills and formats the monthly spreadsheet
pub struct SheetProvisioner {
    journal: Arc<dyn ProvisionJournal>,
    row_labels: RowLabels,
}

impl SheetProvisioner {
    pub fn new(journal: Arc<dyn ProvisionJournal>, row_labels: RowLabels) -> Self {
        Self { journal, row_labels }
    }

    /// Ensure the spreadsheet titled `title` exists and holds `records`
    pub async fn provision(
        &self,
        sheets: &dyn SpreadsheetApi,
        title: &str,
        full_name: &str,
        records: &[ShiftRecord],
    ) -> TimesheetResult<ProvisionOutcome> {
        let token = uuid::Uuid::new_v4().to_string();
        if !self.journal.try_claim(title, &token).await? {
            warn!("'{}' is already being provisioned, skipping", title);
            return Ok(ProvisionOutcome::Busy);
        }
        let claim = ClaimGuard {
            journal: Arc::clone(&self.journal),
            title: title.to_string(),
            token,
            armed: true,
        };

        let result = self.provision_claimed(sheets, title, full_name, records).await;

        claim.release().await;
        if let Err(e) = &result {
            error!("Provisioning '{}' failed: {}", title, e);
        }
        result
    }

    async fn provision_claimed(
        &self,
        sheets: &dyn SpreadsheetApi,
        title: &str,
        full_name: &str,
        records: &[ShiftRecord],
    ) -> TimesheetResult<ProvisionOutcome> {
        let existing = sheets.find_by_title(title).await?;
        let entry = self.journal.entry(title).await?;

        match (existing, entry) {
            (Some(file), Some(entry)) if entry.spreadsheet_id == file.id && !entry.stage.is_finished() => {
                info!("Resuming '{}' after stage {:?}", title, entry.stage);
                self.run_stages(sheets, title, &file.id, entry.stage, full_name, records)
                    .await?;
                Ok(ProvisionOutcome::Resumed {
                    spreadsheet_id: file.id,
                    from: entry.stage,
                })
            }
            (Some(file), _) => {
                info!("Spreadsheet '{}' already exists ({})", title, file.id);
                Ok(ProvisionOutcome::AlreadyExists { spreadsheet_id: file.id })
            }
            (None, _) => {
                let spreadsheet_id = sheets.create(title).await?;
                self.advance(title, &spreadsheet_id, ProvisionStage::Created).await?;
                info!("Created spreadsheet '{}' ({})", title, spreadsheet_id);

                self.run_stages(
                    sheets,
                    title,
                    &spreadsheet_id,
                    ProvisionStage::Created,
                    full_name,
                    records,
                )
                .await?;
                Ok(ProvisionOutcome::Created { spreadsheet_id })
            }
        }
    }

    /// Run every stage after `reached`, recording each one as it completes
    async fn run_stages(
        &self,
        sheets: &dyn SpreadsheetApi,
        title: &str,
        spreadsheet_id: &str,
        reached: ProvisionStage,
        full_name: &str,
        records: &[ShiftRecord],
    ) -> TimesheetResult<()> {
        if reached < ProvisionStage::BoilerplateWritten {
            sheets
                .write_values(spreadsheet_id, &layout::boilerplate(full_name))
                .await?;
            self.advance(title, spreadsheet_id, ProvisionStage::BoilerplateWritten)
                .await?;
        }

        if reached < ProvisionStage::RowsWritten {
            if records.is_empty() {
                info!("No shifts to write for '{}'", title);
            } else {
                sheets
                    .write_values(spreadsheet_id, &layout::shift_rows(records, self.row_labels))
                    .await?;
            }
            self.advance(title, spreadsheet_id, ProvisionStage::RowsWritten)
                .await?;
        }

        if reached < ProvisionStage::Formatted {
            sheets
                .apply_requests(spreadsheet_id, &layout::formatting_requests(SHEET_ID))
                .await?;
            self.advance(title, spreadsheet_id, ProvisionStage::Formatted)
                .await?;
        }

        Ok(())
    }

    async fn advance(&self, title: &str, spreadsheet_id: &str, stage: ProvisionStage) -> TimesheetResult<()> {
        self.journal
            .record(title, &JournalEntry::new(spreadsheet_id, stage))
            .await
    }
}
