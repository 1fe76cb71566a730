//! MessagePack implementation of the table repository.
//!
//! This adapter implements the TableRepository port using rmp_serde for
//! compact binary serialization. Saves go to a temporary sibling file that is
//! then renamed over the target, so readers see either the old table or the
//! new one.

use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use crate::{Result, error::Error, ports::TableRepository, q_learning::SavedQTable};

/// MessagePack-based table repository.
///
/// # Examples
///
/// ```no_run
/// use tabq::adapters::MsgPackRepository;
/// use tabq::ports::TableRepository;
/// use tabq::q_learning::{QTable, SavedQTable};
/// use std::path::Path;
///
/// let repo = MsgPackRepository;
/// let table = QTable::zeros(4, 3)?;
///
/// repo.save(&SavedQTable::from_table(&table), Path::new("agent.qtable"))?;
/// let loaded = repo.load(Path::new("agent.qtable"))?;
/// # Ok::<(), tabq::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackRepository;

impl MsgPackRepository {
    /// Create a new MessagePack repository.
    pub fn new() -> Self {
        Self
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "qtable".to_string());
    let tmp_name = format!(".{file_name}.tmp.{}", std::process::id());
    match path.parent() {
        Some(parent) => parent.join(tmp_name),
        None => PathBuf::from(tmp_name),
    }
}

fn write_temp(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

impl TableRepository for MsgPackRepository {
    fn save(&self, table: &SavedQTable, path: &Path) -> Result<()> {
        let bytes = table.to_bytes()?;
        let tmp = temp_path(path);

        write_temp(&tmp, &bytes).map_err(|source| {
            let _ = fs::remove_file(&tmp);
            Error::Io {
                operation: format!("write temporary table file {tmp:?}"),
                source,
            }
        })?;

        fs::rename(&tmp, path).map_err(|source| {
            let _ = fs::remove_file(&tmp);
            Error::Io {
                operation: format!("replace table file {path:?}"),
                source,
            }
        })?;

        Ok(())
    }

    fn load(&self, path: &Path) -> Result<Option<SavedQTable>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(source) if source.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(Error::Io {
                    operation: format!("read table file {path:?}"),
                    source,
                });
            }
        };

        SavedQTable::from_bytes(&bytes).map(Some)
    }
}
