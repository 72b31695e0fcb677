use crate::error::{journal_error, TimesheetResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use lazy_static::lazy_static;
use redis::{AsyncCommands, Client as RedisClient, Script};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Redis keys
mod keys {
    pub const JOURNAL_PREFIX: &str = "timesheet:journal:";
    pub const CLAIM_PREFIX: &str = "timesheet:claim:";
    /// Entries outlive the month they describe
    pub const ENTRY_EXPIRY_SECONDS: u64 = 45 * 24 * 60 * 60;
    /// A crashed run releases its claim after this long
    pub const CLAIM_EXPIRY_SECONDS: u64 = 5 * 60;
}

lazy_static! {
    /// Delete a claim only while it still holds the releasing run's token
    static ref RELEASE_SCRIPT: Script = Script::new(
        r#"if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
end
return 0"#,
    );
}

/// Remote steps of provisioning one spreadsheet, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProvisionStage {
    Created,
    BoilerplateWritten,
    RowsWritten,
    Formatted,
}

impl ProvisionStage {
    pub fn is_finished(self) -> bool {
        self == ProvisionStage::Formatted
    }
}

/// Last stage reached for one spreadsheet title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub spreadsheet_id: String,
    pub stage: ProvisionStage,
    pub updated_at: DateTime<Utc>,
}

impl JournalEntry {
    pub fn new(spreadsheet_id: &str, stage: ProvisionStage) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.to_string(),
            stage,
            updated_at: Utc::now(),
        }
    }
}

/// Storage for provisioning progress and per-title claims
#[async_trait]
pub trait ProvisionJournal: Send + Sync + 'static {
    /// Progress recorded for a title
    async fn entry(&self, title: &str) -> TimesheetResult<Option<JournalEntry>>;

    /// Record the stage a title has reached
    async fn record(&self, title: &str, entry: &JournalEntry) -> TimesheetResult<()>;

    /// Take the exclusive claim on a title for the run identified by `token`;
    /// false if another run holds an unexpired claim
    async fn try_claim(&self, title: &str, token: &str) -> TimesheetResult<bool>;

    /// Give the claim back, if it is still held by `token`
    async fn release(&self, title: &str, token: &str) -> TimesheetResult<()>;
}

#[derive(Debug)]
struct Claim {
    token: String,
    taken_at: Instant,
}

/// In-memory journal, used when Redis is not configured and in tests
#[derive(Debug)]
pub struct InMemoryJournal {
    entries: RwLock<HashMap<String, JournalEntry>>,
    claims: RwLock<HashMap<String, Claim>>,
    claim_ttl: Duration,
}

impl Default for InMemoryJournal {
    fn default() -> Self {
        Self::with_claim_ttl(Duration::from_secs(keys::CLAIM_EXPIRY_SECONDS))
    }
}

impl InMemoryJournal {
    /// Journal whose claims lapse after `claim_ttl`
    pub fn with_claim_ttl(claim_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            claims: RwLock::new(HashMap::new()),
            claim_ttl,
        }
    }
}

#[async_trait]
impl ProvisionJournal for InMemoryJournal {
    async fn entry(&self, title: &str) -> TimesheetResult<Option<JournalEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.get(title).cloned())
    }

    async fn record(&self, title: &str, entry: &JournalEntry) -> TimesheetResult<()> {
        let mut entries = self.entries.write().await;
        entries.insert(title.to_string(), entry.clone());
        Ok(())
    }

    async fn try_claim(&self, title: &str, token: &str) -> TimesheetResult<bool> {
        let mut claims = self.claims.write().await;
        if let Some(held) = claims.get(title) {
            if held.taken_at.elapsed() < self.claim_ttl {
                return Ok(false);
            }
            debug!("Claim on '{}' expired, taking it over", title);
        }

        claims.insert(
            title.to_string(),
            Claim {
                token: token.to_string(),
                taken_at: Instant::now(),
            },
        );
        Ok(true)
    }

    async fn release(&self, title: &str, token: &str) -> TimesheetResult<()> {
        let mut claims = self.claims.write().await;
        if claims.get(title).is_some_and(|held| held.token == token) {
            claims.remove(title);
        }
        Ok(())
    }
}

/// Redis-backed journal shared by every server instance
#[derive(Clone)]
pub struct RedisJournal {
    conn: ConnectionManager,
}

impl RedisJournal {
    /// Connect to Redis
    pub async fn connect(redis_url: &str) -> TimesheetResult<Self> {
        info!("Connecting to Redis at {}", redis_url);

        let client = RedisClient::open(redis_url)
            .map_err(|e| journal_error(&format!("Failed to create Redis client: {}", e)))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| journal_error(&format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { conn })
    }
}

#[async_trait]
impl ProvisionJournal for RedisJournal {
    async fn entry(&self, title: &str) -> TimesheetResult<Option<JournalEntry>> {
        let key = format!("{}{}", keys::JOURNAL_PREFIX, title);
        let mut conn = self.conn.clone();

        let value: Option<String> = conn.get(&key).await?;
        match value {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn record(&self, title: &str, entry: &JournalEntry) -> TimesheetResult<()> {
        let key = format!("{}{}", keys::JOURNAL_PREFIX, title);
        let json = serde_json::to_string(entry)?;
        let mut conn = self.conn.clone();

        let _: () = conn.set_ex(&key, json, keys::ENTRY_EXPIRY_SECONDS).await?;
        Ok(())
    }

    async fn try_claim(&self, title: &str, token: &str) -> TimesheetResult<bool> {
        let key = format!("{}{}", keys::CLAIM_PREFIX, title);
        let mut conn = self.conn.clone();

        let reply: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(token)
            .arg("NX")
            .arg("EX")
            .arg(keys::CLAIM_EXPIRY_SECONDS)
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn release(&self, title: &str, token: &str) -> TimesheetResult<()> {
        let key = format!("{}{}", keys::CLAIM_PREFIX, title);
        let mut conn = self.conn.clone();

        let deleted: i64 = RELEASE_SCRIPT
            .key(&key)
            .arg(token)
            .invoke_async(&mut conn)
            .await?;
        if deleted == 0 {
            debug!("Claim on '{}' was no longer ours, left in place", title);
        }
        Ok(())
    }
}
