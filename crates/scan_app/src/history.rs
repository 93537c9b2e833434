use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, SecondsFormat, Utc};
use scan_core::HistoryRecord;
use scan_engine::{HistorySink, JsonStore, PersistError};
use scan_logging::{scan_error, scan_info};
use serde::{Deserialize, Serialize};

pub const HISTORY_KEY: &str = "scan_history";
pub const PREFERENCES_KEY: &str = "user_preferences";

pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryKind {
    Barcode {
        code: String,
        product_name: String,
        ingredients: Vec<String>,
    },
    Ocr {
        ingredients: Vec<String>,
        processing_millis: u64,
    },
}

impl From<HistoryRecord> for HistoryKind {
    fn from(record: HistoryRecord) -> Self {
        match record {
            HistoryRecord::Barcode {
                code,
                product_name,
                ingredients,
            } => HistoryKind::Barcode {
                code,
                product_name,
                ingredients,
            },
            HistoryRecord::Ocr {
                ingredients,
                processing_millis,
            } => HistoryKind::Ocr {
                ingredients,
                processing_millis,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: u64,
    /// RFC 3339, UTC.
    pub timestamp: String,
    #[serde(flatten)]
    pub kind: HistoryKind,
}

/// On-disk shape of the history file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct HistoryFile {
    /// Only ever grows, so ids are never reused after a delete or clear.
    next_id: u64,
    entries: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreferences {
    /// Oldest entries are dropped past this many. Zero means unlimited.
    pub history_limit: usize,
    /// Overrides the config file's `auto_analyze` when set.
    pub auto_analyze: Option<bool>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            auto_analyze: None,
        }
    }
}

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Scan history and preferences kept as JSON under the data directory.
pub struct HistoryStore {
    store: JsonStore,
    clock: Clock,
    // Serializes read-modify-write cycles on the history file.
    lock: Mutex<()>,
}

impl HistoryStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self::with_clock(data_dir, Arc::new(Utc::now))
    }

    pub fn with_clock(data_dir: PathBuf, clock: Clock) -> Self {
        Self {
            store: JsonStore::new(data_dir),
            clock,
            lock: Mutex::new(()),
        }
    }

    fn load_file(&self) -> Result<HistoryFile, PersistError> {
        let mut file: HistoryFile = self.store.load(HISTORY_KEY)?.unwrap_or_default();
        let highest = file.entries.iter().map(|entry| entry.id).max().unwrap_or(0);
        file.next_id = file.next_id.max(highest + 1);
        Ok(file)
    }

    /// Oldest first.
    pub fn list(&self) -> Result<Vec<HistoryEntry>, PersistError> {
        Ok(self.load_file()?.entries)
    }

    pub fn append(&self, record: HistoryRecord) -> Result<HistoryEntry, PersistError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut file = self.load_file()?;
        let limit = self.preferences()?.history_limit;

        let entry = HistoryEntry {
            id: file.next_id,
            timestamp: (self.clock)().to_rfc3339_opts(SecondsFormat::Secs, true),
            kind: record.into(),
        };
        file.next_id += 1;
        file.entries.push(entry.clone());
        if limit > 0 && file.entries.len() > limit {
            let excess = file.entries.len() - limit;
            file.entries.drain(..excess);
        }

        self.store.save(HISTORY_KEY, &file)?;
        Ok(entry)
    }

    /// Returns whether an entry with `id` existed.
    pub fn delete(&self, id: u64) -> Result<bool, PersistError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut file = self.load_file()?;
        let before = file.entries.len();
        file.entries.retain(|entry| entry.id != id);
        if file.entries.len() == before {
            return Ok(false);
        }
        self.store.save(HISTORY_KEY, &file)?;
        Ok(true)
    }

    /// Drops every entry but keeps the id counter.
    pub fn clear(&self) -> Result<(), PersistError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut file = self.load_file()?;
        file.entries.clear();
        self.store.save(HISTORY_KEY, &file)?;
        Ok(())
    }

    pub fn preferences(&self) -> Result<UserPreferences, PersistError> {
        Ok(self.store.load(PREFERENCES_KEY)?.unwrap_or_default())
    }

    pub fn save_preferences(&self, preferences: &UserPreferences) -> Result<(), PersistError> {
        self.store.save(PREFERENCES_KEY, preferences)?;
        Ok(())
    }
}

impl HistorySink for HistoryStore {
    fn record(&self, record: HistoryRecord) {
        match self.append(record) {
            Ok(entry) => scan_info!("history: recorded entry {}", entry.id),
            Err(err) => scan_error!("history: failed to record entry: {}", err),
        }
    }
}
