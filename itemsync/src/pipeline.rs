//! Single entry point of a sync run.

use std::fmt;
use std::path::PathBuf;

use chrono::Utc;
use itemsync_config::shared::SyncConfig;
use tracing::{error, info, warn};

use crate::auth::TokenProvider;
use crate::error::SyncError;
use crate::merge::{MergeEngine, MergeMode, MergeOutcome};
use crate::normalize::Normalizer;
use crate::snapshot::SnapshotWriter;
use crate::source::{PaginationHalt, Paginator};
use crate::staging::StagingLoader;
use crate::store::{CommitInfo, TableStore};

/// Stage of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Authenticate,
    Fetch,
    Normalize,
    Staging,
    Merge,
}

impl Stage {
    /// Process exit code reported when this stage fails.
    pub fn exit_code(&self) -> u8 {
        match self {
            Stage::Authenticate => 2,
            Stage::Fetch => 3,
            // The normalized table only exists to be loaded into staging.
            Stage::Normalize | Stage::Staging => 4,
            Stage::Merge => 5,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Authenticate => f.write_str("authenticate"),
            Stage::Fetch => f.write_str("fetch"),
            Stage::Normalize => f.write_str("normalize"),
            Stage::Staging => f.write_str("staging"),
            Stage::Merge => f.write_str("merge"),
        }
    }
}

/// Error that ended a run, with the stage it happened in.
#[derive(Debug, Clone)]
pub struct StageFailure {
    pub stage: Stage,
    pub error: SyncError,
}

impl StageFailure {
    pub fn new(stage: Stage, error: SyncError) -> Self {
        Self { stage, error }
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} stage failed: {}", self.stage, self.error)
    }
}

/// Problem that did not stop a run but makes its result incomplete.
#[derive(Debug, Clone)]
pub enum Degradation {
    /// Pagination stopped early; downstream stages ran on the pages fetched before.
    PaginationHalted(PaginationHalt),
    /// The snapshot file could not be written.
    SnapshotNotWritten(SyncError),
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degradation::PaginationHalted(PaginationHalt::HttpStatus { url, status, .. }) => {
                write!(f, "pagination halted by status {status} from {url}")
            }
            Degradation::PaginationHalted(PaginationHalt::PageLimit { max_pages }) => {
                write!(f, "pagination halted at the limit of {max_pages} pages")
            }
            Degradation::SnapshotNotWritten(err) => write!(f, "snapshot not written: {err}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every stage completed without degradations.
    Success,
    /// The merge was committed but the run was degraded.
    Partial,
    /// A stage failed and the run stopped.
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Success => f.write_str("success"),
            RunStatus::Partial => f.write_str("partial"),
            RunStatus::Failed => f.write_str("failed"),
        }
    }
}

/// What a run did, as returned by [`Pipeline::run`].
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub pages_fetched: u32,
    pub items_fetched: usize,
    pub snapshot_path: Option<PathBuf>,
    pub staging_commit: Option<CommitInfo>,
    pub merge: Option<MergeOutcome>,
    pub degradations: Vec<Degradation>,
    pub failure: Option<StageFailure>,
}

impl PipelineReport {
    pub fn status(&self) -> RunStatus {
        if self.failure.is_some() {
            RunStatus::Failed
        } else if !self.degradations.is_empty() {
            RunStatus::Partial
        } else {
            RunStatus::Success
        }
    }

    /// Maps the report to a process exit code.
    ///
    /// `0` on success, `2` to `5` for a failure of the authenticate, fetch, staging and merge
    /// stages respectively, `6` when the run completed with degradations.
    pub fn exit_code(&self) -> u8 {
        match (&self.failure, self.status()) {
            (Some(failure), _) => failure.stage.exit_code(),
            (None, RunStatus::Partial) => 6,
            (None, _) => 0,
        }
    }

    pub fn merge_mode(&self) -> Option<MergeMode> {
        self.merge.map(|merge| merge.mode)
    }

    pub fn rows_updated(&self) -> usize {
        self.merge.map(|merge| merge.rows_updated).unwrap_or_default()
    }

    pub fn rows_inserted(&self) -> usize {
        self.merge.map(|merge| merge.rows_inserted).unwrap_or_default()
    }

    pub fn target_row_count(&self) -> Option<usize> {
        self.merge.map(|merge| merge.target_row_count)
    }
}

/// Runs the stages of a sync in order: authenticate, fetch, snapshot, normalize, stage, merge.
///
/// A failed snapshot write or an early pagination stop degrades the run and later stages keep
/// going. Any other failure stops the run at the failing stage.
#[derive(Debug)]
pub struct Pipeline<P, S> {
    config: SyncConfig,
    token_provider: P,
    table_store: S,
}

impl<P, S> Pipeline<P, S>
where
    P: TokenProvider,
    S: TableStore,
{
    pub fn new(config: SyncConfig, token_provider: P, table_store: S) -> Self {
        Self {
            config,
            token_provider,
            table_store,
        }
    }

    pub async fn run(self) -> PipelineReport {
        info!(
            endpoint = %self.config.source.endpoint,
            token_provider = self.token_provider.name(),
            store = S::name(),
            "starting sync run"
        );

        let mut report = PipelineReport::default();
        if let Err(failure) = self.execute(&mut report).await {
            error!(
                stage = %failure.stage,
                error = %failure.error,
                "sync run failed"
            );
            report.failure = Some(failure);
        }

        info!(
            status = %report.status(),
            pages = report.pages_fetched,
            items = report.items_fetched,
            rows_updated = report.rows_updated(),
            rows_inserted = report.rows_inserted(),
            degradations = report.degradations.len(),
            "sync run finished"
        );

        report
    }

    async fn execute(&self, report: &mut PipelineReport) -> Result<(), StageFailure> {
        let token = self
            .token_provider
            .token(&self.config.auth.scope)
            .await
            .map_err(|err| StageFailure::new(Stage::Authenticate, err))?;

        let paginator = Paginator::new(&self.config.source)
            .map_err(|err| StageFailure::new(Stage::Fetch, err))?;
        let retrieved_at = Utc::now();
        let outcome = paginator
            .fetch_all(&token)
            .await
            .map_err(|err| StageFailure::new(Stage::Fetch, err))?;

        report.pages_fetched = outcome.pages_fetched;
        report.items_fetched = outcome.items.len();
        if let Some(halt) = outcome.halt {
            report.degradations.push(Degradation::PaginationHalted(halt));
        }
        let items = outcome.items;

        let writer = SnapshotWriter::new(&self.config.snapshot);
        match writer.write(retrieved_at, &items).await {
            Ok(path) => report.snapshot_path = Some(path),
            Err(err) => {
                warn!(
                    directory = %self.config.snapshot.directory.display(),
                    error = %err,
                    "snapshot write failed, continuing without snapshot"
                );
                report.degradations.push(Degradation::SnapshotNotWritten(err));
            }
        }

        let table = Normalizer::new(&self.config.normalize)
            .to_table(&items)
            .map_err(|err| StageFailure::new(Stage::Normalize, err))?;
        drop(items);

        let staging_commit = StagingLoader::new(&self.table_store, &self.config.tables.staging_path)
            .load(table)
            .await
            .map_err(|err| StageFailure::new(Stage::Staging, err))?;
        report.staging_commit = Some(staging_commit);

        let merge = MergeEngine::new(
            &self.table_store,
            &self.config.tables.staging_path,
            &self.config.tables.target_path,
            &self.config.merge,
        )
        .run()
        .await
        .map_err(|err| StageFailure::new(Stage::Merge, err))?;
        report.merge = Some(merge);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use itemsync_config::shared::{
        AuthConfig, MergeConfig, NormalizeConfig, SnapshotConfig, SourceConfig, TablesConfig,
        TokenProviderConfig,
    };
    use secrecy::SecretString;

    use super::*;
    use crate::bail;
    use crate::error::{ErrorKind, SyncResult};
    use crate::store::memory::MemoryTableStore;

    struct RejectingTokenProvider;

    impl TokenProvider for RejectingTokenProvider {
        fn name(&self) -> &'static str {
            "rejecting"
        }

        async fn token(&self, _scope: &str) -> SyncResult<SecretString> {
            bail!(ErrorKind::AuthenticationError, "Credentials were rejected")
        }
    }

    fn config() -> SyncConfig {
        SyncConfig {
            // Never contacted: the run fails before pagination.
            source: SourceConfig::new("http://127.0.0.1:9/items"),
            auth: AuthConfig {
                scope: AuthConfig::DEFAULT_SCOPE.to_string(),
                provider: TokenProviderConfig::Static {
                    token: SecretString::new("token".to_string()),
                },
            },
            snapshot: SnapshotConfig {
                directory: PathBuf::from("snapshots"),
                file_prefix: SnapshotConfig::DEFAULT_FILE_PREFIX.to_string(),
            },
            tables: TablesConfig {
                staging_path: "staging".to_string(),
                target_path: "target".to_string(),
            },
            merge: MergeConfig::default(),
            normalize: NormalizeConfig::default(),
        }
    }

    fn failure(stage: Stage) -> StageFailure {
        StageFailure::new(
            stage,
            crate::sync_error!(ErrorKind::Unknown, "Stage failed"),
        )
    }

    #[test]
    fn empty_report_is_a_success() {
        let report = PipelineReport::default();

        assert_eq!(report.status(), RunStatus::Success);
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn degradations_make_the_run_partial() {
        let report = PipelineReport {
            degradations: vec![Degradation::PaginationHalted(PaginationHalt::PageLimit {
                max_pages: 3,
            })],
            ..Default::default()
        };

        assert_eq!(report.status(), RunStatus::Partial);
        assert_eq!(report.exit_code(), 6);
    }

    #[test]
    fn failures_map_to_their_stage_exit_code() {
        let cases = [
            (Stage::Authenticate, 2),
            (Stage::Fetch, 3),
            (Stage::Normalize, 4),
            (Stage::Staging, 4),
            (Stage::Merge, 5),
        ];

        for (stage, code) in cases {
            let report = PipelineReport {
                degradations: vec![Degradation::SnapshotNotWritten(crate::sync_error!(
                    ErrorKind::IoError,
                    "Snapshot failed"
                ))],
                failure: Some(failure(stage)),
                ..Default::default()
            };

            assert_eq!(report.status(), RunStatus::Failed);
            assert_eq!(report.exit_code(), code, "stage {stage}");
        }
    }

    #[tokio::test]
    async fn authentication_failure_stops_the_run() {
        let store = MemoryTableStore::new();

        let report = Pipeline::new(config(), RejectingTokenProvider, store.clone())
            .run()
            .await;

        let failure = report.failure.as_ref().unwrap();
        assert_eq!(failure.stage, Stage::Authenticate);
        assert_eq!(failure.error.kind(), ErrorKind::AuthenticationError);
        assert_eq!(report.exit_code(), 2);
        assert_eq!(report.pages_fetched, 0);
        assert!(!store.exists("staging").await.unwrap());
        assert!(!store.exists("target").await.unwrap());
    }
}
