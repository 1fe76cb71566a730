//! Repository port for Q-table persistence.
//!
//! This module defines the trait boundary between the decision core and the
//! storage layer. One stored blob holds exactly one table.

use std::path::Path;

use crate::{Result, q_learning::SavedQTable};

/// Port for persisting and loading Q-tables.
///
/// This trait abstracts the storage mechanism, allowing different
/// implementations (MessagePack files, memory) without coupling the learning
/// code to a specific format.
///
/// # Examples
///
/// ```no_run
/// use tabq::ports::TableRepository;
/// use tabq::q_learning::{QTable, SavedQTable};
/// use std::path::Path;
///
/// fn save_table<R: TableRepository>(repo: &R, table: &QTable, path: &Path) -> tabq::Result<()> {
///     repo.save(&SavedQTable::from_table(table), path)
/// }
/// ```
pub trait TableRepository {
    /// Save a table, replacing whatever was stored at `path`.
    ///
    /// Implementations must not leave a partially written table behind: a
    /// failed save keeps the previous contents readable.
    fn save(&self, table: &SavedQTable, path: &Path) -> Result<()>;

    /// Load the table stored at `path`.
    ///
    /// Returns `Ok(None)` if nothing has been stored there yet.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The stored data cannot be read
    /// - The stored data is not a valid table
    fn load(&self, path: &Path) -> Result<Option<SavedQTable>>;
}
