use std::collections::HashMap;

use parking_lot::RwLock;

use crate::fingerprint::Fingerprint;
use crate::record::{FileRecord, ValidationError};

/// Lookup failure. Registration fails only with a [`ValidationError`].
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("file not found: {0}")]
    NotFound(String),
}

/// Fingerprint -> [`FileRecord`] mapping kept by the master.
///
/// Re-registering a fingerprint replaces the previous record wholesale,
///  including its replica set.
#[derive(Debug, Default)]
pub struct Catalog {
    files: RwLock<HashMap<Fingerprint, FileRecord>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and insert `record`, overwriting any existing entry.
    ///  The write lock covers both steps, so a rejected record never
    ///  touches the map.
    pub fn register_file(&self, record: FileRecord) -> Result<Fingerprint, ValidationError> {
        let mut files = self.files.write();
        let fingerprint = record.validate()?;
        if files.insert(fingerprint.clone(), record).is_some() {
            tracing::debug!(%fingerprint, "replaced catalog record");
        }
        Ok(fingerprint)
    }

    pub fn lookup_file(&self, fingerprint: &str) -> Result<FileRecord, CatalogError> {
        // anything that does not parse can never have been registered
        let key: Fingerprint = fingerprint
            .parse()
            .map_err(|_| CatalogError::NotFound(fingerprint.to_string()))?;
        self.files
            .read()
            .get(&key)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(fingerprint.to_string()))
    }

    /// Point-in-time copy of every record, ordered by name then fingerprint.
    ///  The read lock is released before sorting.
    pub fn list_files(&self) -> Vec<FileRecord> {
        let mut files: Vec<FileRecord> = self.files.read().values().cloned().collect();
        files.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.fingerprint.cmp(&b.fingerprint))
        });
        files
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
