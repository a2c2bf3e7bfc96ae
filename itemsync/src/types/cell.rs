use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bail;
use crate::error::{ErrorKind, SyncResult};

/// Logical type of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Boolean,
    Int64,
    Float64,
    Utf8,
    /// Arrays, stored as their JSON text.
    Json,
}

impl DataType {
    /// Returns the type able to hold values of both `self` and `other`.
    ///
    /// Integers widen to floats; any other disagreement falls back to [`DataType::Utf8`].
    pub fn unify(self, other: DataType) -> DataType {
        match (self, other) {
            (a, b) if a == b => a,
            (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => {
                DataType::Float64
            }
            _ => DataType::Utf8,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Boolean => "boolean",
            DataType::Int64 => "int64",
            DataType::Float64 => "float64",
            DataType::Utf8 => "utf8",
            DataType::Json => "json",
        };
        f.write_str(name)
    }
}

/// A single typed value in a table row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    String(String),
    Json(serde_json::Value),
}

impl Cell {
    /// Returns the data type of the value, or [`None`] for [`Cell::Null`].
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Cell::Null => None,
            Cell::Bool(_) => Some(DataType::Boolean),
            Cell::I64(_) => Some(DataType::Int64),
            Cell::F64(_) => Some(DataType::Float64),
            Cell::String(_) => Some(DataType::Utf8),
            Cell::Json(_) => Some(DataType::Json),
        }
    }

    /// Renders the value as JSON text, leaving strings untouched.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Bool(value) => Some(value.to_string()),
            Cell::I64(value) => Some(value.to_string()),
            Cell::F64(value) => Some(serde_json::Value::from(*value).to_string()),
            Cell::String(value) => Some(value.clone()),
            Cell::Json(value) => Some(value.to_string()),
        }
    }

    /// Converts the value into `target`.
    ///
    /// Only conversions allowed by [`DataType::unify`] succeed: integers widen to floats and
    /// every value can be rendered as text.
    pub fn cast(self, target: DataType) -> SyncResult<Cell> {
        let Some(source) = self.data_type() else {
            return Ok(Cell::Null);
        };

        if source == target {
            return Ok(self);
        }

        match (self, target) {
            (Cell::I64(value), DataType::Float64) => Ok(Cell::F64(value as f64)),
            (cell, DataType::Utf8) => Ok(Cell::String(cell.to_text().unwrap_or_default())),
            _ => bail!(
                ErrorKind::ConversionError,
                "Cell cannot be converted to the column type",
                format!("cannot convert {source} to {target}")
            ),
        }
    }
}
