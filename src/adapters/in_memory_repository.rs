//! In-memory table repository for testing.
//!
//! This adapter provides a pure in-memory implementation of TableRepository,
//! enabling fast tests without any file system I/O.

use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{Result, ports::TableRepository, q_learning::SavedQTable};

/// In-memory repository for testing.
///
/// Stores encoded tables in a shared HashMap, avoiding file system I/O
/// entirely.
///
/// # Examples
///
/// ```
/// use tabq::adapters::InMemoryRepository;
/// use tabq::ports::TableRepository;
/// use tabq::q_learning::{QTable, SavedQTable};
/// use std::path::Path;
///
/// let repo = InMemoryRepository::new();
/// let table = QTable::zeros(4, 3)?;
///
/// repo.save(&SavedQTable::from_table(&table), Path::new("agent"))?;
/// let loaded = repo.load(Path::new("agent"))?.expect("stored");
/// assert_eq!(loaded.to_table((4, 3))?, table);
/// # Ok::<(), tabq::Error>(())
/// ```
///
/// # Thread Safety
///
/// All clones share the same underlying storage.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    storage: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryRepository {
    /// Create a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tables currently stored.
    pub fn count(&self) -> usize {
        self.lock().len()
    }

    /// Remove all stored tables.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Check if a table exists at the given path.
    pub fn contains(&self, path: &Path) -> bool {
        self.lock().contains_key(&key(path))
    }

    /// Raw bytes stored at `path`.
    pub fn bytes(&self, path: &Path) -> Option<Vec<u8>> {
        self.lock().get(&key(path)).cloned()
    }

    /// Store arbitrary bytes at `path`, bypassing encoding.
    pub fn insert_raw(&self, path: &Path, bytes: Vec<u8>) {
        self.lock().insert(key(path), bytes);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.storage
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn key(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

impl TableRepository for InMemoryRepository {
    fn save(&self, table: &SavedQTable, path: &Path) -> Result<()> {
        let bytes = table.to_bytes()?;
        self.lock().insert(key(path), bytes);
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<Option<SavedQTable>> {
        match self.lock().get(&key(path)) {
            Some(bytes) => SavedQTable::from_bytes(bytes).map(Some),
            None => Ok(None),
        }
    }
}
