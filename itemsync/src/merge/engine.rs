//! Upsert-without-delete of staging into target.

use std::collections::HashSet;
use std::fmt;

use itemsync_config::shared::MergeConfig;
use tracing::{error, info};

use crate::bail;
use crate::error::{ErrorKind, SyncResult};
use crate::merge::{KeyIndex, MergeKey};
use crate::store::{CommitInfo, TableStore};
use crate::types::{Cell, ColumnSchema, Table, TableRow, TableSchema};

/// How the target table was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// The target did not exist and was created from staging.
    Bootstrap,
    /// The target existed and staging was upserted into it.
    SteadyState,
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeMode::Bootstrap => f.write_str("bootstrap"),
            MergeMode::SteadyState => f.write_str("steady_state"),
        }
    }
}

/// Rows produced by [`upsert`] before they are committed.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertResult {
    pub table: Table,
    /// Target rows whose key matched a staging row.
    pub rows_updated: usize,
    /// Staging rows appended because their key had no target row.
    pub rows_inserted: usize,
}

/// Counts of a committed merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    pub mode: MergeMode,
    pub rows_updated: usize,
    pub rows_inserted: usize,
    pub target_row_count: usize,
    pub commit: CommitInfo,
}

/// Upserts `staging` into `target` on `config.key_column`.
///
/// The result holds every target row, in order, with the columns of `config.update_columns`
/// replaced by the values of the staging row sharing its key (the last one when several do).
/// Other staging columns are not applied to existing rows. Staging rows whose key has no target
/// row follow, in staging order; rows with a null key never match and are always appended.
/// Target rows absent from staging are kept unchanged.
///
/// The result schema is the target columns followed by the staging-only columns. A target column
/// keeps its type unless it holds no values yet, in which case it takes the staging type; existing
/// target values are never converted. Staging values are converted into the result type and a
/// value that cannot be converted fails the merge with [`ErrorKind::SchemaMismatch`].
pub fn upsert(target: Table, staging: Table, config: &MergeConfig) -> SyncResult<UpsertResult> {
    let (target_schema, target_rows) = target.into_parts();
    let (staging_schema, staging_rows) = staging.into_parts();

    require_key_column(&target_schema, !target_rows.is_empty(), &config.key_column, "target")?;
    require_key_column(&staging_schema, !staging_rows.is_empty(), &config.key_column, "staging")?;

    let schema = merged_schema(&target_schema, &target_rows, &staging_schema, &staging_rows);
    let from_target = column_mapping(&schema, &target_schema);
    let from_staging = column_mapping(&schema, &staging_schema);

    let mut rows = target_rows
        .into_iter()
        .map(|row| project_row(row, &schema, &from_target))
        .collect::<SyncResult<Vec<_>>>()?;
    let staging_rows = staging_rows
        .into_iter()
        .map(|row| project_row(row, &schema, &from_staging))
        .collect::<SyncResult<Vec<_>>>()?;

    let Some(key_column) = schema.column_index(&config.key_column) else {
        // Neither side has rows nor the key column, so there is nothing to match.
        return Ok(UpsertResult {
            table: Table::try_new(schema, rows)?,
            rows_updated: 0,
            rows_inserted: 0,
        });
    };

    let update_columns = config
        .update_columns
        .iter()
        .filter_map(|name| schema.column_index(name))
        .collect::<Vec<_>>();

    let staging_index = KeyIndex::build(&staging_rows, key_column);
    let mut target_keys = HashSet::with_capacity(rows.len());
    let mut rows_updated = 0;

    for row in rows.iter_mut() {
        let Some(key) = MergeKey::from_cell(&row.values()[key_column]) else {
            continue;
        };

        if let Some(position) = staging_index.get(&key) {
            let source = &staging_rows[position];
            for &column in &update_columns {
                row.values_mut()[column] = source.values()[column].clone();
            }
            rows_updated += 1;
        }

        target_keys.insert(key);
    }

    let mut rows_inserted = 0;
    for row in staging_rows {
        let matched = MergeKey::from_cell(&row.values()[key_column])
            .is_some_and(|key| target_keys.contains(&key));
        if !matched {
            rows.push(row);
            rows_inserted += 1;
        }
    }

    Ok(UpsertResult {
        table: Table::try_new(schema, rows)?,
        rows_updated,
        rows_inserted,
    })
}

fn require_key_column(
    schema: &TableSchema,
    has_rows: bool,
    key_column: &str,
    side: &str,
) -> SyncResult<()> {
    if has_rows && schema.column_index(key_column).is_none() {
        bail!(
            ErrorKind::SchemaMismatch,
            "Merge key column is missing",
            format!("{side} table has no column `{key_column}`")
        );
    }

    Ok(())
}

/// Target columns followed by staging-only columns.
///
/// Columns without any value on one side place no constraint on the type, so an all-null
/// staging column leaves the target type alone.
fn merged_schema(
    target: &TableSchema,
    target_rows: &[TableRow],
    staging: &TableSchema,
    staging_rows: &[TableRow],
) -> TableSchema {
    let mut columns = target
        .columns()
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let staging_type = staging
                .column_index(&column.name)
                .filter(|&position| has_values(staging_rows, position))
                .map(|position| staging.columns()[position].data_type);

            match staging_type {
                Some(data_type) if !has_values(target_rows, index) => {
                    ColumnSchema::new(column.name.clone(), data_type)
                }
                _ => column.clone(),
            }
        })
        .collect::<Vec<_>>();

    columns.extend(
        staging
            .columns()
            .iter()
            .filter(|column| target.column_index(&column.name).is_none())
            .cloned(),
    );

    TableSchema::new(columns)
}

fn has_values(rows: &[TableRow], column: usize) -> bool {
    rows.iter()
        .any(|row| !matches!(row.get(column), None | Some(Cell::Null)))
}

/// For each column of `schema`, the position of the same column in `source`.
fn column_mapping(schema: &TableSchema, source: &TableSchema) -> Vec<Option<usize>> {
    schema
        .column_names()
        .map(|name| source.column_index(name))
        .collect()
}

/// Rearranges `row` into the column order and types of `schema`, filling absent columns with
/// nulls.
fn project_row(
    row: TableRow,
    schema: &TableSchema,
    mapping: &[Option<usize>],
) -> SyncResult<TableRow> {
    let mut source = row.into_values();
    let mut values = Vec::with_capacity(schema.len());

    for (column, position) in schema.columns().iter().zip(mapping) {
        let cell = match position {
            Some(position) => std::mem::replace(&mut source[*position], Cell::Null),
            None => Cell::Null,
        };
        let cell = match cell.cast(column.data_type) {
            Ok(cell) => cell,
            Err(err) => bail!(
                ErrorKind::SchemaMismatch,
                "Value conflicts with the target column type",
                format!(
                    "column `{}` is {}: {}",
                    column.name,
                    column.data_type,
                    err.detail().unwrap_or_default()
                ),
                source: err
            ),
        };
        values.push(cell);
    }

    Ok(TableRow::new(values))
}

/// Reconciles the staging table into the target table of a [`TableStore`].
#[derive(Debug)]
pub struct MergeEngine<'a, S> {
    store: &'a S,
    staging_path: &'a str,
    target_path: &'a str,
    config: &'a MergeConfig,
}

impl<'a, S> MergeEngine<'a, S>
where
    S: TableStore,
{
    pub fn new(
        store: &'a S,
        staging_path: &'a str,
        target_path: &'a str,
        config: &'a MergeConfig,
    ) -> Self {
        Self {
            store,
            staging_path,
            target_path,
            config,
        }
    }

    /// Merges staging into target and commits the result as a full overwrite.
    ///
    /// A missing target is bootstrapped from staging. Any other failure to read the target
    /// aborts the merge so that an unreadable target is never replaced.
    pub async fn run(&self) -> SyncResult<MergeOutcome> {
        let result = self.merge().await;
        if let Err(err) = &result {
            error!(
                staging_table = self.staging_path,
                target_table = self.target_path,
                error = %err,
                "merge failed, target left unchanged"
            );
        }

        result
    }

    async fn merge(&self) -> SyncResult<MergeOutcome> {
        info!(
            store = S::name(),
            staging_table = self.staging_path,
            target_table = self.target_path,
            key = %self.config.key_column,
            "starting merge operation"
        );

        let staging = self.store.scan(self.staging_path).await?;

        let (mode, result) = match self.store.scan(self.target_path).await {
            Ok(target) => (
                MergeMode::SteadyState,
                upsert(target, staging, self.config)?,
            ),
            Err(err) if err.kind() == ErrorKind::TableMissing => {
                info!(
                    target_table = self.target_path,
                    "target table missing, bootstrapping from staging"
                );

                let rows_inserted = staging.num_rows();
                (
                    MergeMode::Bootstrap,
                    UpsertResult {
                        table: staging,
                        rows_updated: 0,
                        rows_inserted,
                    },
                )
            }
            Err(err) => return Err(err),
        };

        let commit = self.store.overwrite(self.target_path, result.table).await?;

        let outcome = MergeOutcome {
            mode,
            rows_updated: result.rows_updated,
            rows_inserted: result.rows_inserted,
            target_row_count: commit.row_count,
            commit,
        };

        info!(
            mode = %outcome.mode,
            rows_updated = outcome.rows_updated,
            rows_inserted = outcome.rows_inserted,
            target_rows = outcome.target_row_count,
            version = outcome.commit.version,
            "merge committed"
        );

        Ok(outcome)
    }
}
