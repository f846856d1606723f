use std::path::{Path, PathBuf};
use std::sync::Mutex;

use directories::ProjectDirs;
use redb::{Database, ReadableTable, TableDefinition};

use crate::shared::error::{AppError, AppResult};

use super::types::StoredSnapshot;

/// Redb table holding the cached snapshot.
/// Key: fixed entry name, Value: serialized StoredSnapshot
const RATES_TABLE: TableDefinition<&str, &str> = TableDefinition::new("currency_rates");
const SNAPSHOT_KEY: &str = "rate_snapshot";

/// Persistence for the single cached rate snapshot
pub trait SnapshotStore: Send + Sync {
    fn load(&self) -> AppResult<Option<StoredSnapshot>>;
    fn save(&self, snapshot: &StoredSnapshot) -> AppResult<()>;
}

/// Redb-based storage implementation
pub struct RedbSnapshotStore {
    db: Database,
}

impl RedbSnapshotStore {
    pub fn open(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Storage(format!("Failed to create data directory: {}", e)))?;
        }
        let db = Database::create(path)
            .map_err(|e| AppError::Storage(format!("Failed to create database: {}", e)))?;
        Ok(Self { db })
    }

    /// `<data dir>/currency_rates.redb`
    pub fn default_path() -> AppResult<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "antigravity", "unit-converter-pro")
            .ok_or_else(|| AppError::Storage("Unable to determine data directory".into()))?;
        Ok(proj_dirs.data_dir().join("currency_rates.redb"))
    }
}

impl SnapshotStore for RedbSnapshotStore {
    fn load(&self) -> AppResult<Option<StoredSnapshot>> {
        let txn = self.db.begin_read()
            .map_err(|e| AppError::Storage(format!("Failed to begin read: {}", e)))?;

        // A fresh database has no table yet
        let table = match txn.open_table(RATES_TABLE) {
            Ok(table) => table,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(AppError::Storage(format!("Failed to open table: {}", e))),
        };

        let Some(entry) = table.get(SNAPSHOT_KEY)
            .map_err(|e| AppError::Storage(format!("Failed to read entry: {}", e)))?
        else {
            return Ok(None);
        };

        let stored: StoredSnapshot = serde_json::from_str(entry.value())
            .map_err(|e| AppError::Storage(format!("Corrupt rate snapshot: {}", e)))?;
        Ok(Some(stored))
    }

    fn save(&self, snapshot: &StoredSnapshot) -> AppResult<()> {
        let serialized = serde_json::to_string(snapshot)
            .map_err(|e| AppError::Storage(format!("Serialization error: {}", e)))?;

        let txn = self.db.begin_write()
            .map_err(|e| AppError::Storage(format!("Failed to begin write: {}", e)))?;
        {
            let mut table = txn.open_table(RATES_TABLE)
                .map_err(|e| AppError::Storage(format!("Failed to open table: {}", e)))?;
            table.insert(SNAPSHOT_KEY, serialized.as_str())
                .map_err(|e| AppError::Storage(format!("Failed to insert: {}", e)))?;
        }
        txn.commit()
            .map_err(|e| AppError::Storage(format!("Failed to commit: {}", e)))
    }
}

/// Process-local store, used when no data directory is available and in tests
#[derive(Default)]
pub struct MemorySnapshotStore {
    slot: Mutex<Option<StoredSnapshot>>,
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> AppResult<Option<StoredSnapshot>> {
        self.slot
            .lock()
            .map(|guard| guard.clone())
            .map_err(|e| AppError::Storage(format!("Mutex poisoned: {}", e)))
    }

    fn save(&self, snapshot: &StoredSnapshot) -> AppResult<()> {
        let mut guard = self.slot
            .lock()
            .map_err(|e| AppError::Storage(format!("Mutex poisoned: {}", e)))?;
        *guard = Some(snapshot.clone());
        Ok(())
    }
}
