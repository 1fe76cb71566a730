//! Serialization support for Q-tables.

use serde::{Deserialize, Serialize};

use crate::{Result, error::Error, q_learning::QTable};

/// On-disk form of a Q-table: shape plus row-major values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedQTable {
    pub version: u32,
    pub states: usize,
    pub actions: usize,
    pub values: Vec<f64>,
}

impl SavedQTable {
    pub const VERSION: u32 = 1;

    pub fn from_table(table: &QTable) -> Self {
        let (states, actions) = table.shape();
        Self {
            version: Self::VERSION,
            states,
            actions,
            values: table.values().to_vec(),
        }
    }

    /// Rebuild the table, requiring the stored shape to equal `expected`.
    ///
    /// A different shape is a configuration error; the table is never
    /// truncated or padded to fit.
    pub fn to_table(&self, expected: (usize, usize)) -> Result<QTable> {
        self.check_version()?;
        let (expected_states, expected_actions) = expected;
        if (self.states, self.actions) != expected {
            return Err(Error::ShapeMismatch {
                stored_states: self.states,
                stored_actions: self.actions,
                expected_states,
                expected_actions,
            });
        }
        QTable::from_values(self.states, self.actions, self.values.clone())
    }

    fn check_version(&self) -> Result<()> {
        if self.version != Self::VERSION {
            return Err(Error::CorruptTable {
                reason: format!(
                    "unsupported table format version {}, expected {}",
                    self.version,
                    Self::VERSION
                ),
            });
        }
        Ok(())
    }

    /// Encode as MessagePack bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        rmp_serde::to_vec(self).map_err(|e| Error::SerializationContext {
            operation: "serialize Q-table to MessagePack".to_string(),
            message: e.to_string(),
        })
    }

    /// Decode from MessagePack bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        rmp_serde::from_slice(bytes).map_err(|e| Error::SerializationContext {
            operation: "deserialize Q-table from MessagePack".to_string(),
            message: e.to_string(),
        })
    }
}

impl From<QTable> for SavedQTable {
    fn from(table: QTable) -> Self {
        Self::from_table(&table)
    }
}

impl TryFrom<SavedQTable> for QTable {
    type Error = Error;

    fn try_from(saved: SavedQTable) -> Result<Self> {
        saved.check_version()?;
        QTable::from_values(saved.states, saved.actions, saved.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_preserves_values() -> Result<()> {
        let mut table = QTable::zeros(4, 3)?;
        table.update(2, 1, 1.0, 3, 0.4, 0.9)?;
        table.update(0, 2, -0.1, 2, 0.4, 0.9)?;

        let bytes = SavedQTable::from_table(&table).to_bytes()?;
        let restored = SavedQTable::from_bytes(&bytes)?.to_table((4, 3))?;

        assert_eq!(restored, table);
        Ok(())
    }

    #[test]
    fn test_shape_mismatch_is_not_padded() -> Result<()> {
        let saved = SavedQTable::from_table(&QTable::zeros(4, 3)?);
        let err = saved.to_table((8, 6)).unwrap_err();
        assert!(matches!(
            err,
            Error::ShapeMismatch {
                stored_states: 4,
                stored_actions: 3,
                expected_states: 8,
                expected_actions: 6
            }
        ));
        Ok(())
    }

    #[test]
    fn test_unknown_version_rejected() -> Result<()> {
        let mut saved = SavedQTable::from_table(&QTable::zeros(2, 2)?);
        saved.version = 99;
        assert!(matches!(
            saved.to_table((2, 2)),
            Err(Error::CorruptTable { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        let result = SavedQTable::from_bytes(b"not a table");
        assert!(matches!(result, Err(Error::SerializationContext { .. })));
    }
}
