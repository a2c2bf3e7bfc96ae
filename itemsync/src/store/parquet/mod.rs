//! Parquet-backed table store.
//!
//! A table is a directory holding a `_manifest.json` and the Parquet data file it points to.
//! An overwrite writes a fresh `part-<uuid>.parquet`, swaps the manifest atomically and only
//! then removes superseded data files, so a crash at any point leaves a readable table.

mod encoding;
mod manifest;

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::Utc;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::properties::WriterProperties;
use tracing::{debug, info, warn};

use crate::bail;
use crate::error::{ErrorKind, SyncResult};
use crate::store::{CommitInfo, TableStore};
use crate::types::Table;

pub use encoding::{append_record_batch, arrow_schema, table_to_record_batch};
pub use manifest::{MANIFEST_FILE_NAME, Manifest};

const DATA_FILE_PREFIX: &str = "part-";
const DATA_FILE_EXTENSION: &str = "parquet";

/// Stores each table as a directory of Parquet files on the local filesystem.
///
/// Table paths are directories; relative paths resolve against the working directory.
#[derive(Debug, Clone, Default)]
pub struct ParquetTableStore;

impl ParquetTableStore {
    pub fn new() -> Self {
        Self
    }
}

impl TableStore for ParquetTableStore {
    fn name() -> &'static str {
        "parquet"
    }

    async fn exists(&self, path: &str) -> SyncResult<bool> {
        let directory = PathBuf::from(path);
        let manifest = tokio::task::spawn_blocking(move || Manifest::read(&directory)).await??;

        Ok(manifest.is_some())
    }

    async fn scan(&self, path: &str) -> SyncResult<Table> {
        let directory = PathBuf::from(path);
        let table = tokio::task::spawn_blocking(move || scan_table(&directory)).await??;

        debug!(path, rows = table.num_rows(), "table scanned");

        Ok(table)
    }

    async fn overwrite(&self, path: &str, table: Table) -> SyncResult<CommitInfo> {
        let directory = PathBuf::from(path);
        let commit =
            tokio::task::spawn_blocking(move || overwrite_table(&directory, &table)).await??;

        info!(
            path,
            version = commit.version,
            rows = commit.row_count,
            "table overwritten"
        );

        Ok(commit)
    }
}

fn scan_table(directory: &Path) -> SyncResult<Table> {
    let Some(manifest) = Manifest::read(directory)? else {
        bail!(
            ErrorKind::TableMissing,
            "Table does not exist",
            format!("no {MANIFEST_FILE_NAME} in `{}`", directory.display())
        );
    };

    let Some(data_file) = &manifest.data_file else {
        if manifest.row_count != 0 {
            bail!(
                ErrorKind::TableCorrupted,
                "Table manifest has rows but no data file",
                format!("`{}` declares {} rows", directory.display(), manifest.row_count)
            );
        }
        return Ok(Table::empty(manifest.schema));
    };

    let data_path = directory.join(data_file);
    let file = match File::open(&data_path) {
        Ok(file) => file,
        Err(err) => bail!(
            ErrorKind::TableCorrupted,
            "Table data file referenced by the manifest cannot be opened",
            format!("{}: {err}", data_path.display()),
            source: err
        ),
    };

    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut rows = Vec::with_capacity(manifest.row_count);
    for batch in reader {
        let batch = batch?;
        append_record_batch(&batch, &manifest.schema, &mut rows)?;
    }

    if rows.len() != manifest.row_count {
        bail!(
            ErrorKind::TableCorrupted,
            "Table data file row count does not match the manifest",
            format!(
                "{} holds {} rows, manifest declares {}",
                data_path.display(),
                rows.len(),
                manifest.row_count
            )
        );
    }

    Table::try_new(manifest.schema, rows)
}

fn overwrite_table(directory: &Path, table: &Table) -> SyncResult<CommitInfo> {
    std::fs::create_dir_all(directory)?;

    let previous_version = match Manifest::read(directory) {
        Ok(manifest) => manifest.map(|manifest| manifest.version).unwrap_or(0),
        Err(err) if err.kind() == ErrorKind::TableCorrupted => {
            warn!(
                path = %directory.display(),
                error = %err,
                "replacing table with an unreadable manifest"
            );
            0
        }
        Err(err) => return Err(err),
    };

    let data_file = if table.schema().is_empty() {
        if !table.is_empty() {
            bail!(
                ErrorKind::InvalidData,
                "Rows without columns cannot be stored",
                format!("{} rows", table.num_rows())
            );
        }
        None
    } else {
        Some(write_data_file(directory, table)?)
    };

    let manifest = Manifest {
        version: previous_version + 1,
        committed_at: Utc::now(),
        schema: table.schema().clone(),
        row_count: table.num_rows(),
        data_file: data_file.clone(),
    };
    manifest.write(directory)?;

    remove_stale_data_files(directory, data_file.as_deref());

    Ok(CommitInfo {
        version: manifest.version,
        row_count: manifest.row_count,
    })
}

fn write_data_file(directory: &Path, table: &Table) -> SyncResult<String> {
    let file_name = format!(
        "{DATA_FILE_PREFIX}{}.{DATA_FILE_EXTENSION}",
        uuid::Uuid::new_v4()
    );
    let batch = table_to_record_batch(table)?;

    let file = File::create(directory.join(&file_name))?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    if batch.num_rows() > 0 {
        writer.write(&batch)?;
    }
    let file = writer.into_inner()?;
    file.sync_all()?;

    Ok(file_name)
}

/// Removes data files other than `current`. Failures only leave garbage behind.
fn remove_stale_data_files(directory: &Path, current: Option<&str>) {
    let entries = match std::fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(path = %directory.display(), error = %err, "cannot list table directory");
            return;
        }
    };

    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };

        let is_data_file = file_name.starts_with(DATA_FILE_PREFIX)
            && file_name.ends_with(&format!(".{DATA_FILE_EXTENSION}"));
        if !is_data_file || Some(file_name) == current {
            continue;
        }

        if let Err(err) = std::fs::remove_file(entry.path()) {
            warn!(file = %entry.path().display(), error = %err, "cannot remove stale data file");
        }
    }
}
