use crate::bail;
use crate::error::{ErrorKind, SyncResult};
use crate::types::{TableRow, TableSchema};

/// Rectangular data: a schema and rows of matching width.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    schema: TableSchema,
    rows: Vec<TableRow>,
}

impl Table {
    /// Builds a table, checking that every row has one cell per column and every cell agrees
    /// with its column type.
    pub fn try_new(schema: TableSchema, rows: Vec<TableRow>) -> SyncResult<Self> {
        if let Some(name) = schema.duplicate_column() {
            bail!(
                ErrorKind::SchemaMismatch,
                "Table schema contains a duplicate column",
                format!("column `{name}` appears more than once")
            );
        }

        for (row_index, row) in rows.iter().enumerate() {
            if row.values().len() != schema.len() {
                bail!(
                    ErrorKind::SchemaMismatch,
                    "Table row width does not match the schema",
                    format!(
                        "row {row_index} has {} cells but the schema has {} columns",
                        row.values().len(),
                        schema.len()
                    )
                );
            }

            for (cell, column) in row.values().iter().zip(schema.columns()) {
                if let Some(data_type) = cell.data_type()
                    && data_type != column.data_type
                {
                    bail!(
                        ErrorKind::SchemaMismatch,
                        "Table cell does not match its column type",
                        format!(
                            "row {row_index} column `{}` holds {data_type} but is declared {}",
                            column.name, column.data_type
                        )
                    );
                }
            }
        }

        Ok(Self { schema, rows })
    }

    pub fn empty(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_parts(self) -> (TableSchema, Vec<TableRow>) {
        (self.schema, self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Cell, ColumnSchema, DataType};

    fn schema() -> TableSchema {
        TableSchema::new(vec![
            ColumnSchema::new("id", DataType::Utf8),
            ColumnSchema::new("size", DataType::Int64),
        ])
    }

    #[test]
    fn accepts_nulls_in_any_column() {
        let table = Table::try_new(
            schema(),
            vec![TableRow::new(vec![Cell::String("1".into()), Cell::Null])],
        )
        .unwrap();

        assert_eq!(table.num_rows(), 1);
    }

    #[test]
    fn rejects_rows_of_wrong_width() {
        let err = Table::try_new(schema(), vec![TableRow::new(vec![Cell::Null])]).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
    }

    #[test]
    fn rejects_mistyped_cells() {
        let err = Table::try_new(
            schema(),
            vec![TableRow::new(vec![Cell::String("1".into()), Cell::Bool(true)])],
        )
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
    }

    #[test]
    fn rejects_duplicate_columns() {
        let schema = TableSchema::new(vec![
            ColumnSchema::new("id", DataType::Utf8),
            ColumnSchema::new("id", DataType::Utf8),
        ]);

        let err = Table::try_new(schema, vec![]).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
    }
}
