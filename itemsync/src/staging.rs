//! Loading of the normalized snapshot into the staging table.

use tracing::{error, info};

use crate::error::SyncResult;
use crate::store::{CommitInfo, TableStore};
use crate::types::Table;

/// Replaces the staging table with the current run's rows.
#[derive(Debug)]
pub struct StagingLoader<'a, S> {
    store: &'a S,
    path: &'a str,
}

impl<'a, S> StagingLoader<'a, S>
where
    S: TableStore,
{
    pub fn new(store: &'a S, path: &'a str) -> Self {
        Self { store, path }
    }

    /// Overwrites the staging table with `table`.
    pub async fn load(&self, table: Table) -> SyncResult<CommitInfo> {
        info!(
            store = S::name(),
            path = self.path,
            rows = table.num_rows(),
            columns = table.schema().len(),
            "loading staging table"
        );

        match self.store.overwrite(self.path, table).await {
            Ok(commit) => Ok(commit),
            Err(err) => {
                error!(path = self.path, error = %err, "staging load failed");
                Err(err)
            }
        }
    }
}
