use serde::Deserialize;

use crate::shared::{
    AuthConfig, MergeConfig, NormalizeConfig, SnapshotConfig, SourceConfig, TablesConfig,
    ValidationError,
};

/// Complete configuration of one sync run.
///
/// This intentionally does not implement [`serde::Serialize`] because [`AuthConfig`] holds
/// secrets.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    pub source: SourceConfig,
    pub auth: AuthConfig,
    pub snapshot: SnapshotConfig,
    pub tables: TablesConfig,
    #[serde(default)]
    pub merge: MergeConfig,
    #[serde(default)]
    pub normalize: NormalizeConfig,
}

impl SyncConfig {
    /// Validates every section, returning the first violation found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.source.validate()?;
        self.auth.validate()?;
        self.snapshot.validate()?;
        self.tables.validate()?;
        self.merge.validate()?;
        self.normalize.validate()?;

        Ok(())
    }
}
