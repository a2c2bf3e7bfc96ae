//! Conversion between [`Table`] and Arrow record batches.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array, StringArray,
};
use arrow::datatypes::{DataType as ArrowDataType, Field, Float64Type, Int64Type, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;

use crate::bail;
use crate::error::{ErrorKind, SyncResult};
use crate::types::{Cell, DataType, Table, TableRow, TableSchema};

/// Arrow type used to store a column. Json columns are stored as their text.
fn arrow_type(data_type: DataType) -> ArrowDataType {
    match data_type {
        DataType::Boolean => ArrowDataType::Boolean,
        DataType::Int64 => ArrowDataType::Int64,
        DataType::Float64 => ArrowDataType::Float64,
        DataType::Utf8 | DataType::Json => ArrowDataType::Utf8,
    }
}

/// Builds the Arrow schema for `schema`. Every column is nullable.
pub fn arrow_schema(schema: &TableSchema) -> SchemaRef {
    let fields = schema
        .columns()
        .iter()
        .map(|column| Field::new(&column.name, arrow_type(column.data_type), true))
        .collect::<Vec<_>>();

    Arc::new(Schema::new(fields))
}

/// Converts a table to a single record batch.
pub fn table_to_record_batch(table: &Table) -> SyncResult<RecordBatch> {
    let schema = arrow_schema(table.schema());
    let rows = table.rows();

    let columns = table
        .schema()
        .columns()
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let cells = rows.iter().map(move |row| &row.values()[index]);
            column_to_array(column.data_type, cells)
        })
        .collect::<SyncResult<Vec<_>>>()?;

    let batch = RecordBatch::try_new(schema, columns)?;

    Ok(batch)
}

fn column_to_array<'a>(
    data_type: DataType,
    cells: impl Iterator<Item = &'a Cell>,
) -> SyncResult<ArrayRef> {
    let array: ArrayRef = match data_type {
        DataType::Boolean => Arc::new(
            cells
                .map(|cell| match cell {
                    Cell::Bool(value) => Ok(Some(*value)),
                    Cell::Null => Ok(None),
                    other => Err(cell_mismatch(other, data_type)),
                })
                .collect::<SyncResult<BooleanArray>>()?,
        ),
        DataType::Int64 => Arc::new(
            cells
                .map(|cell| match cell {
                    Cell::I64(value) => Ok(Some(*value)),
                    Cell::Null => Ok(None),
                    other => Err(cell_mismatch(other, data_type)),
                })
                .collect::<SyncResult<Int64Array>>()?,
        ),
        DataType::Float64 => Arc::new(
            cells
                .map(|cell| match cell {
                    Cell::F64(value) => Ok(Some(*value)),
                    Cell::Null => Ok(None),
                    other => Err(cell_mismatch(other, data_type)),
                })
                .collect::<SyncResult<Float64Array>>()?,
        ),
        DataType::Utf8 => Arc::new(
            cells
                .map(|cell| match cell {
                    Cell::String(value) => Ok(Some(value.clone())),
                    Cell::Null => Ok(None),
                    other => Err(cell_mismatch(other, data_type)),
                })
                .collect::<SyncResult<StringArray>>()?,
        ),
        DataType::Json => Arc::new(
            cells
                .map(|cell| match cell {
                    Cell::Json(value) => Ok(Some(value.to_string())),
                    Cell::Null => Ok(None),
                    other => Err(cell_mismatch(other, data_type)),
                })
                .collect::<SyncResult<StringArray>>()?,
        ),
    };

    Ok(array)
}

fn cell_mismatch(cell: &Cell, data_type: DataType) -> crate::error::SyncError {
    crate::sync_error!(
        ErrorKind::SchemaMismatch,
        "Cell does not match its column type",
        format!("expected {data_type}, found {cell:?}")
    )
}

/// Appends the rows of `batch` to `rows`, reading columns with the types of `schema`.
pub fn append_record_batch(
    batch: &RecordBatch,
    schema: &TableSchema,
    rows: &mut Vec<TableRow>,
) -> SyncResult<()> {
    if batch.num_columns() != schema.len() {
        bail!(
            ErrorKind::TableCorrupted,
            "Data file columns do not match the manifest schema",
            format!(
                "data file has {} columns, manifest declares {}",
                batch.num_columns(),
                schema.len()
            )
        );
    }

    let start = rows.len();
    rows.extend((0..batch.num_rows()).map(|_| TableRow::new(Vec::with_capacity(schema.len()))));

    for (array, column) in batch.columns().iter().zip(schema.columns()) {
        let expected = arrow_type(column.data_type);
        if array.data_type() != &expected {
            bail!(
                ErrorKind::TableCorrupted,
                "Data file column type does not match the manifest schema",
                format!(
                    "column `{}` is stored as {} but declared {}",
                    column.name,
                    array.data_type(),
                    column.data_type
                )
            );
        }

        for row_index in 0..batch.num_rows() {
            let cell = array_value_to_cell(array, row_index, column.data_type)?;
            rows[start + row_index].values_mut().push(cell);
        }
    }

    Ok(())
}

fn array_value_to_cell(array: &ArrayRef, row_index: usize, data_type: DataType) -> SyncResult<Cell> {
    if array.is_null(row_index) {
        return Ok(Cell::Null);
    }

    let cell = match data_type {
        DataType::Boolean => Cell::Bool(array.as_boolean().value(row_index)),
        DataType::Int64 => Cell::I64(array.as_primitive::<Int64Type>().value(row_index)),
        DataType::Float64 => Cell::F64(array.as_primitive::<Float64Type>().value(row_index)),
        DataType::Utf8 => Cell::String(array.as_string::<i32>().value(row_index).to_string()),
        DataType::Json => {
            let text = array.as_string::<i32>().value(row_index);
            match serde_json::from_str(text) {
                Ok(value) => Cell::Json(value),
                Err(err) => bail!(
                    ErrorKind::TableCorrupted,
                    "Stored JSON value could not be parsed",
                    err.to_string(),
                    source: err
                ),
            }
        }
    };

    Ok(cell)
}
