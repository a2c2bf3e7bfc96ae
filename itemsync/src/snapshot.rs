//! Date-keyed JSON snapshots of retrieved items.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use itemsync_config::shared::SnapshotConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::SyncResult;
use crate::types::ItemRecord;

/// Complete result of one retrieval, as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub retrieved_at: DateTime<Utc>,
    pub item_count: usize,
    pub items: Vec<ItemRecord>,
}

/// Writes snapshots as `<directory>/<prefix>_<YYYYMMDD>.json`.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    directory: PathBuf,
    file_prefix: String,
}

impl SnapshotWriter {
    pub fn new(config: &SnapshotConfig) -> Self {
        Self {
            directory: config.directory.clone(),
            file_prefix: config.file_prefix.clone(),
        }
    }

    /// Returns the path of the snapshot for the day of `retrieved_at`.
    pub fn snapshot_path(&self, retrieved_at: DateTime<Utc>) -> PathBuf {
        self.directory.join(format!(
            "{}_{}.json",
            self.file_prefix,
            retrieved_at.format("%Y%m%d")
        ))
    }

    /// Writes `items` to the file of the day of `retrieved_at`, replacing an earlier snapshot of
    /// the same day.
    ///
    /// The file either holds the complete new snapshot or is left as it was: content goes to a
    /// temporary file in the same directory which is then renamed into place.
    pub async fn write(
        &self,
        retrieved_at: DateTime<Utc>,
        items: &[ItemRecord],
    ) -> SyncResult<PathBuf> {
        let path = self.snapshot_path(retrieved_at);
        let snapshot = SnapshotRef {
            retrieved_at,
            item_count: items.len(),
            items,
        };
        let contents = serde_json::to_vec_pretty(&snapshot)?;

        let directory = self.directory.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&directory, &target, &contents))
            .await??;

        info!(path = %path.display(), items = items.len(), "snapshot written");

        Ok(path)
    }
}

/// Borrowing twin of [`Snapshot`] so writing does not clone the items.
#[derive(Serialize)]
struct SnapshotRef<'a> {
    retrieved_at: DateTime<Utc>,
    item_count: usize,
    items: &'a [ItemRecord],
}

/// Reads a snapshot previously written by [`SnapshotWriter::write`].
pub fn read_snapshot(path: &Path) -> SyncResult<Snapshot> {
    let contents = std::fs::read(path)?;
    let snapshot = serde_json::from_slice(&contents)?;

    Ok(snapshot)
}

fn write_atomically(directory: &Path, target: &Path, contents: &[u8]) -> SyncResult<()> {
    std::fs::create_dir_all(directory)?;

    let mut file = tempfile::Builder::new()
        .prefix(".snapshot-")
        .suffix(".tmp")
        .tempfile_in(directory)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(target)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn writer(directory: &Path) -> SnapshotWriter {
        SnapshotWriter::new(&SnapshotConfig {
            directory: directory.to_path_buf(),
            file_prefix: "items".to_string(),
        })
    }

    fn record(id: &str) -> ItemRecord {
        json!({"id": id, "name": format!("item {id}"), "type": "Report"})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[tokio::test]
    async fn writes_date_named_snapshot_and_creates_directory() {
        let dir = tempfile::Builder::new().prefix("snapshots").tempdir().unwrap();
        let nested = dir.path().join("raw").join("items");
        let retrieved_at = Utc.with_ymd_and_hms(2024, 3, 9, 23, 59, 0).unwrap();

        let path = writer(&nested)
            .write(retrieved_at, &[record("1"), record("2")])
            .await
            .unwrap();

        assert_eq!(path, nested.join("items_20240309.json"));
        let snapshot = read_snapshot(&path).unwrap();
        assert_eq!(snapshot.retrieved_at, retrieved_at);
        assert_eq!(snapshot.item_count, 2);
        assert_eq!(snapshot.items[1]["id"], "2");
    }

    #[tokio::test]
    async fn same_day_rerun_replaces_the_file() {
        let dir = tempfile::Builder::new().prefix("snapshots").tempdir().unwrap();
        let writer = writer(dir.path());
        let morning = Utc.with_ymd_and_hms(2024, 3, 9, 8, 0, 0).unwrap();
        let evening = Utc.with_ymd_and_hms(2024, 3, 9, 20, 0, 0).unwrap();

        writer.write(morning, &[record("1")]).await.unwrap();
        let path = writer.write(evening, &[]).await.unwrap();

        let snapshot = read_snapshot(&path).unwrap();
        assert_eq!(snapshot.retrieved_at, evening);
        assert!(snapshot.items.is_empty());

        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn unwritable_directory_is_an_error() {
        let dir = tempfile::Builder::new().prefix("snapshots").tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let result = writer(&blocker.join("nested"))
            .write(Utc::now(), &[record("1")])
            .await;

        assert!(result.is_err());
    }
}
