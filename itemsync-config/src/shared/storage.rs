use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

fn default_file_prefix() -> String {
    SnapshotConfig::DEFAULT_FILE_PREFIX.to_string()
}

/// Where the raw snapshot of each run is written.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnapshotConfig {
    /// Directory holding `<file_prefix>_<YYYYMMDD>.json` files. Created when absent.
    pub directory: PathBuf,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl SnapshotConfig {
    pub const DEFAULT_FILE_PREFIX: &'static str = "items";

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.directory.as_os_str().is_empty() {
            return Err(ValidationError::EmptyField("snapshot.directory"));
        }
        if self.file_prefix.trim().is_empty() {
            return Err(ValidationError::EmptyField("snapshot.file_prefix"));
        }

        Ok(())
    }
}

/// Locations of the staging and target tables.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TablesConfig {
    pub staging_path: String,
    pub target_path: String,
}

impl TablesConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.staging_path.trim().is_empty() {
            return Err(ValidationError::EmptyField("tables.staging_path"));
        }
        if self.target_path.trim().is_empty() {
            return Err(ValidationError::EmptyField("tables.target_path"));
        }
        if self.staging_path == self.target_path {
            return Err(ValidationError::InvalidFieldValue {
                field: "tables.target_path".to_string(),
                constraint: "must differ from `tables.staging_path`".to_string(),
            });
        }

        Ok(())
    }
}
