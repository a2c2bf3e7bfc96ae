//! Flattening of nested item records into a single table.
//!
//! Nested objects become columns named by joining their key path with a separator. Schema
//! inference is its own pass over the records so the full column set and every column type are
//! known before the first row is built.

use std::collections::HashMap;

use itemsync_config::shared::NormalizeConfig;
use serde_json::Value;
use tracing::debug;

use crate::bail;
use crate::error::{ErrorKind, SyncResult};
use crate::types::{Cell, ColumnSchema, DataType, ItemRecord, Table, TableRow, TableSchema};

/// Turns item records into rows of a rectangular table.
#[derive(Debug, Clone)]
pub struct Normalizer {
    separator: String,
}

impl Normalizer {
    pub fn new(config: &NormalizeConfig) -> Self {
        Self {
            separator: config.separator.clone(),
        }
    }

    /// Infers the table schema of `records`.
    ///
    /// Columns are the union of every leaf path, in first-seen order. A column's type is the
    /// unification of the JSON types observed in it; a column holding only nulls is text.
    pub fn infer_schema(&self, records: &[ItemRecord]) -> TableSchema {
        let mut names: Vec<String> = Vec::new();
        let mut observed: Vec<Option<DataType>> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for record in records {
            self.visit_leaves(record, &mut |path, value| {
                let index = *positions.entry(path.clone()).or_insert_with(|| {
                    names.push(path);
                    observed.push(None);
                    names.len() - 1
                });

                if let Some(data_type) = json_data_type(value) {
                    observed[index] = Some(match observed[index] {
                        Some(current) => current.unify(data_type),
                        None => data_type,
                    });
                }
            });
        }

        let columns = names
            .into_iter()
            .zip(observed)
            .map(|(name, data_type)| ColumnSchema::new(name, data_type.unwrap_or(DataType::Utf8)))
            .collect::<Vec<_>>();

        debug!(
            records = records.len(),
            columns = columns.len(),
            "inferred table schema"
        );

        TableSchema::new(columns)
    }

    /// Builds one row per record against `schema`.
    ///
    /// Paths missing from a record yield null cells. Values are converted to their column type;
    /// a path absent from `schema` is an error.
    pub fn normalize(&self, records: &[ItemRecord], schema: &TableSchema) -> SyncResult<Table> {
        let positions: HashMap<&str, usize> = schema
            .column_names()
            .enumerate()
            .map(|(index, name)| (name, index))
            .collect();

        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            let mut values = vec![Cell::Null; schema.len()];
            let mut failure = None;

            self.visit_leaves(record, &mut |path, value| {
                if failure.is_some() {
                    return;
                }

                let Some(&index) = positions.get(path.as_str()) else {
                    failure = Some(crate::sync_error!(
                        ErrorKind::SchemaMismatch,
                        "Record contains a column missing from the schema",
                        format!("column `{path}`")
                    ));
                    return;
                };

                match json_to_cell(value).cast(schema.columns()[index].data_type) {
                    Ok(cell) => values[index] = cell,
                    Err(err) => failure = Some(err),
                }
            });

            if let Some(err) = failure {
                return Err(err);
            }

            rows.push(TableRow::new(values));
        }

        Table::try_new(schema.clone(), rows)
    }

    /// Infers the schema of `records` and builds the table in one call.
    pub fn to_table(&self, records: &[ItemRecord]) -> SyncResult<Table> {
        let schema = self.infer_schema(records);
        if schema.is_empty() && !records.is_empty() {
            bail!(
                ErrorKind::InvalidData,
                "Records have no columns",
                format!("{} records contain only empty objects", records.len())
            );
        }

        self.normalize(records, &schema)
    }

    /// Calls `visit` with the joined path of every non-object value in `record`.
    fn visit_leaves<F>(&self, record: &ItemRecord, visit: &mut F)
    where
        F: FnMut(String, &Value),
    {
        for (key, value) in record {
            self.visit_value(key.clone(), value, visit);
        }
    }

    fn visit_value<F>(&self, path: String, value: &Value, visit: &mut F)
    where
        F: FnMut(String, &Value),
    {
        match value {
            Value::Object(object) => {
                for (key, nested) in object {
                    let nested_path = format!("{path}{}{key}", self.separator);
                    self.visit_value(nested_path, nested, visit);
                }
            }
            _ => visit(path, value),
        }
    }
}

fn json_data_type(value: &Value) -> Option<DataType> {
    match value {
        Value::Null => None,
        Value::Bool(_) => Some(DataType::Boolean),
        Value::Number(number) if number.is_i64() => Some(DataType::Int64),
        Value::Number(_) => Some(DataType::Float64),
        Value::String(_) => Some(DataType::Utf8),
        Value::Array(_) => Some(DataType::Json),
        Value::Object(_) => None,
    }
}

fn json_to_cell(value: &Value) -> Cell {
    match value {
        Value::Null | Value::Object(_) => Cell::Null,
        Value::Bool(value) => Cell::Bool(*value),
        Value::Number(number) => match number.as_i64() {
            Some(value) => Cell::I64(value),
            None => Cell::F64(number.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(value) => Cell::String(value.clone()),
        Value::Array(_) => Cell::Json(value.clone()),
    }
}
