//! Persistence of one agent's Q-table at a configured location.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{debug, info, warn};

use crate::{
    Result,
    ports::TableRepository,
    q_learning::{QTable, SavedQTable},
};

/// Binds a repository to the path and shape of one agent's table.
#[derive(Clone)]
pub struct TableStore {
    repository: Arc<dyn TableRepository + Send + Sync>,
    path: PathBuf,
    shape: (usize, usize),
}

impl std::fmt::Debug for TableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableStore")
            .field("path", &self.path)
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

impl TableStore {
    pub fn new(
        repository: Arc<dyn TableRepository + Send + Sync>,
        path: impl Into<PathBuf>,
        shape: (usize, usize),
    ) -> Self {
        Self {
            repository,
            path: path.into(),
            shape,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// (state count, action count) this store accepts.
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Overwrite the stored table.
    pub fn save(&self, table: &QTable) -> Result<()> {
        self.repository
            .save(&SavedQTable::from_table(table), &self.path)?;
        debug!(path = %self.path.display(), "Q-table saved");
        Ok(())
    }

    /// Load the stored table, or a zero table when nothing is stored yet.
    ///
    /// # Errors
    ///
    /// A stored table of a different shape yields [`crate::Error::ShapeMismatch`].
    /// Unreadable or corrupt data yields a persistence error.
    pub fn load(&self) -> Result<QTable> {
        let (states, actions) = self.shape;
        match self.repository.load(&self.path)? {
            Some(saved) => {
                let table = saved.to_table(self.shape)?;
                info!(path = %self.path.display(), states, actions, "Loaded Q-table");
                Ok(table)
            }
            None => {
                info!(
                    path = %self.path.display(),
                    states,
                    actions,
                    "No stored Q-table, starting from zeros"
                );
                QTable::zeros(states, actions)
            }
        }
    }

    /// Like [`TableStore::load`], but recovers from storage failures.
    ///
    /// Configuration errors still propagate; I/O and decoding failures fall
    /// back to a zero table with a warning.
    pub fn load_or_zeros(&self) -> Result<QTable> {
        match self.load() {
            Ok(table) => Ok(table),
            Err(err) if err.is_persistence_error() => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "Could not load Q-table, continuing with an in-memory table"
                );
                QTable::zeros(self.shape.0, self.shape.1)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{adapters::InMemoryRepository, error::Error};

    fn store(repo: &InMemoryRepository, shape: (usize, usize)) -> TableStore {
        TableStore::new(Arc::new(repo.clone()), "agent.qtable", shape)
    }

    #[test]
    fn test_missing_table_loads_as_zeros() {
        let repo = InMemoryRepository::new();
        let table = store(&repo, (4, 3)).load().unwrap();
        assert_eq!(table, QTable::zeros(4, 3).unwrap());
    }

    #[test]
    fn test_save_then_load() {
        let repo = InMemoryRepository::new();
        let store = store(&repo, (4, 3));
        let mut table = QTable::zeros(4, 3).unwrap();
        table.update(1, 2, 0.2, 0, 0.4, 0.9).unwrap();

        store.save(&table).unwrap();
        assert_eq!(store.load().unwrap(), table);
    }

    #[test]
    fn test_shape_mismatch_is_fatal_even_with_fallback() {
        let repo = InMemoryRepository::new();
        store(&repo, (4, 3))
            .save(&QTable::zeros(4, 3).unwrap())
            .unwrap();

        let err = store(&repo, (8, 6)).load_or_zeros().unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_corrupt_data_falls_back_to_zeros() {
        let repo = InMemoryRepository::new();
        repo.insert_raw(Path::new("agent.qtable"), b"garbage".to_vec());

        let store = store(&repo, (4, 3));
        assert!(store.load().unwrap_err().is_persistence_error());
        assert_eq!(store.load_or_zeros().unwrap(), QTable::zeros(4, 3).unwrap());
    }
}
