use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};

use crate::app_dirs::AppDirs;
use crate::error::StoreError;
use crate::stats::Stats;

/// Well-known key the stats record lives under in every backend.
pub const STATS_KEY: &str = "probabilisticSpinnerStats";

/// Durable home for the lifetime [`Stats`].
///
/// `load` never fails: absent or unreadable data comes back as defaults.
/// `save` replaces the stored record in full or not at all.
pub trait StatsStore {
    fn load(&self) -> Stats;
    fn save(&self, stats: &Stats) -> Result<(), StoreError>;
    /// Drop the stored record entirely.
    fn clear(&self) -> Result<(), StoreError>;
}

impl<T: StatsStore + ?Sized> StatsStore for Box<T> {
    fn load(&self) -> Stats {
        (**self).load()
    }

    fn save(&self, stats: &Stats) -> Result<(), StoreError> {
        (**self).save(stats)
    }

    fn clear(&self) -> Result<(), StoreError> {
        (**self).clear()
    }
}

/// JSON file holding a key -> record object, so other keys written by the
/// host application survive our writes.
#[derive(Debug, Clone)]
pub struct FileStatsStore {
    path: PathBuf,
}

impl FileStatsStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::stats_json_path().unwrap_or_else(|| PathBuf::from("hourspin_stats.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when the file is absent or holds no usable JSON object.
    /// Any other read failure is an error so writes never clobber it.
    fn read_entries(&self) -> Result<Option<Map<String, Value>>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(entries)) => Ok(Some(entries)),
            Ok(_) => {
                tracing::warn!(path = ?self.path, "stats file is not a JSON object");
                Ok(None)
            }
            Err(err) => {
                tracing::warn!(path = ?self.path, error = %err, "failed to parse stats file");
                Ok(None)
            }
        }
    }

    fn write_entries(&self, entries: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(entries)?;

        // write aside, then swap in
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl Default for FileStatsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsStore for FileStatsStore {
    fn load(&self) -> Stats {
        let entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(path = ?self.path, error = %err, "failed to read stats file");
                None
            }
        };
        entries
            .and_then(|entries| entries.get(STATS_KEY).map(Stats::from_value_lenient))
            .unwrap_or_default()
    }

    fn save(&self, stats: &Stats) -> Result<(), StoreError> {
        let mut entries = match self.read_entries()? {
            Some(entries) => entries,
            None => {
                if self.path.exists() {
                    tracing::warn!(path = ?self.path, "replacing unparseable stats file");
                }
                Map::new()
            }
        };
        entries.insert(STATS_KEY.to_string(), serde_json::to_value(stats)?);
        self.write_entries(&entries)
    }

    fn clear(&self) -> Result<(), StoreError> {
        let Some(mut entries) = self.read_entries()? else {
            return Ok(());
        };
        if entries.remove(STATS_KEY).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}

/// SQLite-backed key/value table.
#[derive(Debug)]
pub struct SqliteStatsStore {
    conn: Connection,
}

impl SqliteStatsStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_default() -> Result<Self, StoreError> {
        let path = AppDirs::stats_db_path().unwrap_or_else(|| PathBuf::from("hourspin_stats.db"));
        Self::open(path)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }

    fn read_value(&self) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [STATS_KEY], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }
}

impl StatsStore for SqliteStatsStore {
    fn load(&self) -> Stats {
        match self.read_value() {
            Ok(Some(text)) => Stats::from_json_lenient(text.as_bytes()),
            Ok(None) => Stats::default(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read stats row, using defaults");
                Stats::default()
            }
        }
    }

    fn save(&self, stats: &Stats) -> Result<(), StoreError> {
        let text = serde_json::to_string(stats)?;
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            r#"
            INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![STATS_KEY, text],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", [STATS_KEY])?;
        Ok(())
    }
}

/// In-process key/value map. Writes can be made to fail on demand.
#[derive(Debug, Default)]
pub struct MemoryStatsStore {
    entries: RefCell<HashMap<String, String>>,
    fail_writes: Cell<bool>,
}

impl MemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stats(stats: &Stats) -> Result<Self, StoreError> {
        let store = Self::new();
        store.save(stats)?;
        Ok(store)
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Raw stored text for a key.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }
}

impl StatsStore for MemoryStatsStore {
    fn load(&self) -> Stats {
        self.raw(STATS_KEY)
            .map(|text| Stats::from_json_lenient(text.as_bytes()))
            .unwrap_or_default()
    }

    fn save(&self, stats: &Stats) -> Result<(), StoreError> {
        if self.fail_writes.get() {
            return Err(StoreError::Unavailable);
        }
        let text = serde_json::to_string(stats)?;
        self.entries.borrow_mut().insert(STATS_KEY.to_string(), text);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        if self.fail_writes.get() {
            return Err(StoreError::Unavailable);
        }
        self.entries.borrow_mut().remove(STATS_KEY);
        Ok(())
    }
}
