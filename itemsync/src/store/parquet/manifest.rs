use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bail;
use crate::error::{ErrorKind, SyncResult};
use crate::types::TableSchema;

/// File naming the current version of a table.
pub const MANIFEST_FILE_NAME: &str = "_manifest.json";

/// Pointer to the committed version of a Parquet table.
///
/// Readers only follow the manifest, so data files that are not referenced by it are invisible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u64,
    pub committed_at: DateTime<Utc>,
    pub schema: TableSchema,
    pub row_count: usize,
    /// Data file relative to the table directory. Tables without columns have none.
    pub data_file: Option<String>,
}

impl Manifest {
    /// Reads the manifest of the table in `directory`.
    ///
    /// Returns [`None`] when the table was never committed.
    pub fn read(directory: &Path) -> SyncResult<Option<Manifest>> {
        let path = directory.join(MANIFEST_FILE_NAME);

        let contents = match std::fs::read(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_slice(&contents) {
            Ok(manifest) => Ok(Some(manifest)),
            Err(err) => bail!(
                ErrorKind::TableCorrupted,
                "Table manifest could not be parsed",
                format!("{}: {err}", path.display()),
                source: err
            ),
        }
    }

    /// Atomically replaces the manifest of the table in `directory` with `self`.
    pub fn write(&self, directory: &Path) -> SyncResult<()> {
        let contents = serde_json::to_vec_pretty(self)?;

        let mut file = tempfile::Builder::new()
            .prefix("._manifest-")
            .suffix(".tmp")
            .tempfile_in(directory)?;
        file.write_all(&contents)?;
        file.as_file().sync_all()?;
        file.persist(directory.join(MANIFEST_FILE_NAME))?;

        Ok(())
    }
}
