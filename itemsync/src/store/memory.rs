use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::bail;
use crate::error::{ErrorKind, SyncResult};
use crate::store::{CommitInfo, TableStore};
use crate::types::Table;

#[derive(Debug, Default)]
struct Inner {
    tables: HashMap<String, (u64, Table)>,
}

/// In-memory table store for tests and dry runs.
///
/// Clones share the same tables, so a test can keep a handle and inspect what the pipeline
/// committed.
#[derive(Debug, Clone, Default)]
pub struct MemoryTableStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the committed version of the table at `path`.
    pub async fn version(&self, path: &str) -> Option<u64> {
        let inner = self.inner.lock().await;
        inner.tables.get(path).map(|(version, _)| *version)
    }

    /// Returns a copy of the table at `path`.
    pub async fn table(&self, path: &str) -> Option<Table> {
        let inner = self.inner.lock().await;
        inner.tables.get(path).map(|(_, table)| table.clone())
    }
}

impl TableStore for MemoryTableStore {
    fn name() -> &'static str {
        "memory"
    }

    async fn exists(&self, path: &str) -> SyncResult<bool> {
        let inner = self.inner.lock().await;
        Ok(inner.tables.contains_key(path))
    }

    async fn scan(&self, path: &str) -> SyncResult<Table> {
        let inner = self.inner.lock().await;

        match inner.tables.get(path) {
            Some((_, table)) => Ok(table.clone()),
            None => bail!(
                ErrorKind::TableMissing,
                "Table does not exist",
                format!("no table at `{path}`")
            ),
        }
    }

    async fn overwrite(&self, path: &str, table: Table) -> SyncResult<CommitInfo> {
        let mut inner = self.inner.lock().await;

        let version = inner
            .tables
            .get(path)
            .map(|(version, _)| version + 1)
            .unwrap_or(1);
        let row_count = table.num_rows();

        info!(path, version, rows = row_count, "overwriting in-memory table");

        inner.tables.insert(path.to_string(), (version, table));

        Ok(CommitInfo { version, row_count })
    }
}
