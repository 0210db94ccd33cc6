//! Reading and writing records.

use std::path::Path;

use crate::error::RecordError;
use crate::record::Record;

/// Persistence for records addressed by filesystem path.
///
/// A record is always written back to the path it was read from; the store
/// never renames files.
pub trait RecordStore {
    fn read(&self, path: &Path) -> Result<Record, RecordError>;

    fn write(&self, record: &Record, path: &Path) -> Result<(), RecordError>;
}

/// Stores each record as a pretty-printed JSON document.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRecordStore;

impl RecordStore for JsonRecordStore {
    fn read(&self, path: &Path) -> Result<Record, RecordError> {
        let bytes = std::fs::read(path).map_err(|source| RecordError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| RecordError::Document {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write(&self, record: &Record, path: &Path) -> Result<(), RecordError> {
        let json = serde_json::to_vec_pretty(record).map_err(|source| RecordError::Document {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| RecordError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
