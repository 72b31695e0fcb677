pub mod client;
pub mod journal;
pub mod layout;
pub mod provisioner;

pub use client::{GoogleSheetsClient, SpreadsheetApi, SpreadsheetFile};
pub use journal::{InMemoryJournal, JournalEntry, ProvisionJournal, ProvisionStage, RedisJournal};
pub use layout::{RowLabels, ValueRange};
pub use provisioner::{ProvisionOutcome, SheetProvisioner};
