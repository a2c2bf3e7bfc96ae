use itemsync::error::{ErrorKind, SyncResult};
use itemsync::store::{CommitInfo, TableStore};
use itemsync::sync_error;
use itemsync::types::Table;

/// Table store failing every overwrite of one path and delegating everything else.
#[derive(Debug, Clone)]
pub struct FailingTableStore<S> {
    inner: S,
    failing_path: String,
}

impl<S> FailingTableStore<S> {
    pub fn wrap(inner: S, failing_path: &str) -> Self {
        Self {
            inner,
            failing_path: failing_path.to_string(),
        }
    }
}

impl<S> TableStore for FailingTableStore<S>
where
    S: TableStore + Sync,
{
    fn name() -> &'static str {
        "failing"
    }

    async fn exists(&self, path: &str) -> SyncResult<bool> {
        self.inner.exists(path).await
    }

    async fn scan(&self, path: &str) -> SyncResult<Table> {
        self.inner.scan(path).await
    }

    async fn overwrite(&self, path: &str, table: Table) -> SyncResult<CommitInfo> {
        if path == self.failing_path {
            return Err(sync_error!(
                ErrorKind::StorageError,
                "Injected overwrite failure",
                format!("path `{path}`")
            ));
        }

        self.inner.overwrite(path, table).await
    }
}
