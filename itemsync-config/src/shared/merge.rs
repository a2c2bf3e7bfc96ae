use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

fn default_key_column() -> String {
    MergeConfig::DEFAULT_KEY_COLUMN.to_string()
}

fn default_update_columns() -> Vec<String> {
    MergeConfig::DEFAULT_UPDATE_COLUMNS
        .iter()
        .map(|column| column.to_string())
        .collect()
}

fn default_separator() -> String {
    NormalizeConfig::DEFAULT_SEPARATOR.to_string()
}

/// Upsert settings for merging staging into the target table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MergeConfig {
    /// Column identifying a row in both tables.
    #[serde(default = "default_key_column")]
    pub key_column: String,
    /// Columns overwritten on target rows whose key matches a staging row.
    #[serde(default = "default_update_columns")]
    pub update_columns: Vec<String>,
}

impl MergeConfig {
    pub const DEFAULT_KEY_COLUMN: &'static str = "id";
    pub const DEFAULT_UPDATE_COLUMNS: &'static [&'static str] = &["name", "type"];

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.key_column.trim().is_empty() {
            return Err(ValidationError::EmptyField("merge.key_column"));
        }
        if self.update_columns.is_empty() {
            return Err(ValidationError::NoUpdateColumns);
        }
        if self.update_columns.contains(&self.key_column) {
            return Err(ValidationError::KeyColumnInUpdateColumns(
                self.key_column.clone(),
            ));
        }
        if self.update_columns.iter().any(|c| c.trim().is_empty()) {
            return Err(ValidationError::EmptyField("merge.update_columns"));
        }

        Ok(())
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            key_column: default_key_column(),
            update_columns: default_update_columns(),
        }
    }
}

/// Flattening settings for turning records into table rows.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NormalizeConfig {
    /// Joins nested object keys into a column name.
    #[serde(default = "default_separator")]
    pub separator: String,
}

impl NormalizeConfig {
    pub const DEFAULT_SEPARATOR: &'static str = ".";

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.separator.is_empty() {
            return Err(ValidationError::EmptyField("normalize.separator"));
        }

        Ok(())
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            separator: default_separator(),
        }
    }
}
