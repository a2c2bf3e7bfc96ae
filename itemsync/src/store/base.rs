use std::future::Future;

use crate::error::SyncResult;
use crate::types::Table;

/// Result of a successful [`TableStore::overwrite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitInfo {
    /// Version of the table after the commit, starting at 1 for the first commit.
    pub version: u64,
    pub row_count: usize,
}

/// Storage for whole tables addressed by path.
///
/// Implementations must make [`TableStore::overwrite`] atomic: a reader sees either the previous
/// table or the new one, and a failed overwrite leaves the previous table readable.
pub trait TableStore {
    /// Returns the name of the store, used in logs.
    fn name() -> &'static str;

    /// Returns whether a table has been committed at `path`.
    fn exists(&self, path: &str) -> impl Future<Output = SyncResult<bool>> + Send;

    /// Reads the current version of the table at `path`.
    ///
    /// Fails with [`crate::error::ErrorKind::TableMissing`] when nothing was ever committed
    /// there.
    fn scan(&self, path: &str) -> impl Future<Output = SyncResult<Table>> + Send;

    /// Replaces the table at `path` with `table`, creating it when absent.
    fn overwrite(
        &self,
        path: &str,
        table: Table,
    ) -> impl Future<Output = SyncResult<CommitInfo>> + Send;
}
