mod common;

use itemsync::auth::{ConfiguredTokenProvider, TokenProvider};
use itemsync::error::ErrorKind;
use itemsync::merge::MergeMode;
use itemsync::pipeline::{Degradation, Pipeline, RunStatus, Stage};
use itemsync::snapshot::read_snapshot;
use itemsync::store::TableStore;
use itemsync::store::memory::MemoryTableStore;
use itemsync::types::Cell;
use itemsync_config::shared::TokenProviderConfig;
use itemsync_telemetry::tracing::init_test_tracing;
use secrecy::SecretString;
use serde_json::json;
use tempfile::TempDir;
use wiremock::ResponseTemplate;

use common::api::ItemsApiMock;
use common::store::FailingTableStore;
use common::{STAGING_PATH, TARGET_PATH, item, sync_config, test_token};

fn snapshot_dir() -> TempDir {
    tempfile::Builder::new().prefix("snapshots").tempdir().unwrap()
}

fn static_provider() -> ConfiguredTokenProvider {
    ConfiguredTokenProvider::from_config(&TokenProviderConfig::Static {
        token: test_token(),
    })
    .unwrap()
}

async fn target_names(store: &MemoryTableStore) -> Vec<(Cell, Cell)> {
    let target = store.table(TARGET_PATH).await.unwrap();
    let id = target.schema().column_index("id").unwrap();
    let name = target.schema().column_index("name").unwrap();

    target
        .rows()
        .iter()
        .map(|row| (row.values()[id].clone(), row.values()[name].clone()))
        .collect()
}

fn text(value: &str) -> Cell {
    Cell::String(value.to_string())
}

#[tokio::test]
async fn runs_bootstrap_then_steady_state() {
    init_test_tracing();

    let snapshots = snapshot_dir();
    let store = MemoryTableStore::new();

    let api = ItemsApiMock::start().await;
    api.mount_pages(vec![
        vec![item("1", "A", "Report")],
        vec![item("2", "B", "Dataset")],
    ])
    .await;
    let config = sync_config(api.endpoint(), snapshots.path());

    let report = Pipeline::new(config, static_provider(), store.clone())
        .run()
        .await;

    assert_eq!(report.status(), RunStatus::Success);
    assert_eq!(report.exit_code(), 0);
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.items_fetched, 2);
    assert_eq!(report.merge_mode(), Some(MergeMode::Bootstrap));
    assert_eq!(report.target_row_count(), Some(2));

    let snapshot = read_snapshot(report.snapshot_path.as_deref().unwrap()).unwrap();
    assert_eq!(snapshot.item_count, 2);
    assert_eq!(snapshot.items[1]["creatorPrincipal"]["type"], "User");

    let staging = store.table(STAGING_PATH).await.unwrap();
    assert!(staging.schema().column("creatorPrincipal.id").is_some());

    let api = ItemsApiMock::start().await;
    api.mount_pages(vec![vec![
        item("1", "A2", "Report"),
        item("3", "C", "Notebook"),
    ]])
    .await;
    let config = sync_config(api.endpoint(), snapshots.path());

    let report = Pipeline::new(config, static_provider(), store.clone())
        .run()
        .await;

    assert_eq!(report.status(), RunStatus::Success);
    assert_eq!(report.merge_mode(), Some(MergeMode::SteadyState));
    assert_eq!(report.rows_updated(), 1);
    assert_eq!(report.rows_inserted(), 1);
    assert_eq!(report.target_row_count(), Some(3));
    assert_eq!(store.version(TARGET_PATH).await, Some(2));
    assert_eq!(
        target_names(&store).await,
        vec![
            (text("1"), text("A2")),
            (text("2"), text("B")),
            (text("3"), text("C")),
        ]
    );
}

#[tokio::test]
async fn snapshot_failure_does_not_stop_the_merge() {
    init_test_tracing();

    let snapshots = snapshot_dir();
    let blocker = snapshots.path().join("not-a-directory");
    std::fs::write(&blocker, b"").unwrap();
    let store = MemoryTableStore::new();

    let api = ItemsApiMock::start().await;
    api.mount_pages(vec![vec![item("1", "A", "Report")]]).await;
    let config = sync_config(api.endpoint(), &blocker.join("nested"));

    let report = Pipeline::new(config, static_provider(), store.clone())
        .run()
        .await;

    assert_eq!(report.status(), RunStatus::Partial);
    assert_eq!(report.exit_code(), 6);
    assert!(report.snapshot_path.is_none());
    assert!(matches!(
        report.degradations.as_slice(),
        [Degradation::SnapshotNotWritten(_)]
    ));
    assert_eq!(report.merge_mode(), Some(MergeMode::Bootstrap));
    assert_eq!(target_names(&store).await, vec![(text("1"), text("A"))]);
}

#[tokio::test]
async fn halted_pagination_merges_the_partial_result() {
    init_test_tracing();

    let snapshots = snapshot_dir();
    let store = MemoryTableStore::new();

    let api = ItemsApiMock::start().await;
    let first = json!({
        "itemEntities": [item("1", "A", "Report")],
        "continuationUri": api.page_url(2)
    });
    api.mount_response(1, ResponseTemplate::new(200).set_body_json(first))
        .await;
    api.mount_response(2, ResponseTemplate::new(503).set_body_string("unavailable"))
        .await;
    let config = sync_config(api.endpoint(), snapshots.path());

    let report = Pipeline::new(config, static_provider(), store.clone())
        .run()
        .await;

    assert_eq!(report.status(), RunStatus::Partial);
    assert_eq!(report.exit_code(), 6);
    assert!(matches!(
        report.degradations.as_slice(),
        [Degradation::PaginationHalted(_)]
    ));
    assert!(report.snapshot_path.is_some());
    assert_eq!(target_names(&store).await, vec![(text("1"), text("A"))]);
}

#[tokio::test]
async fn malformed_page_fails_before_staging() {
    init_test_tracing();

    let snapshots = snapshot_dir();
    let store = MemoryTableStore::new();

    let api = ItemsApiMock::start().await;
    api.mount_response(1, ResponseTemplate::new(200).set_body_string("not json"))
        .await;
    let config = sync_config(api.endpoint(), snapshots.path());

    let report = Pipeline::new(config, static_provider(), store.clone())
        .run()
        .await;

    let failure = report.failure.as_ref().unwrap();
    assert_eq!(failure.stage, Stage::Fetch);
    assert_eq!(failure.error.kind(), ErrorKind::SourceResponseInvalid);
    assert_eq!(report.exit_code(), 3);
    assert!(!store.exists(STAGING_PATH).await.unwrap());
    assert_eq!(std::fs::read_dir(snapshots.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn staging_failure_leaves_the_target_untouched() {
    init_test_tracing();

    let snapshots = snapshot_dir();
    let memory = MemoryTableStore::new();

    let api = ItemsApiMock::start().await;
    api.mount_pages(vec![vec![item("1", "A", "Report")]]).await;
    let config = sync_config(api.endpoint(), snapshots.path());
    Pipeline::new(config, static_provider(), memory.clone())
        .run()
        .await;

    let api = ItemsApiMock::start().await;
    api.mount_pages(vec![vec![item("1", "A2", "Report")]]).await;
    let config = sync_config(api.endpoint(), snapshots.path());
    let store = FailingTableStore::wrap(memory.clone(), STAGING_PATH);

    let report = Pipeline::new(config, static_provider(), store).run().await;

    let failure = report.failure.as_ref().unwrap();
    assert_eq!(failure.stage, Stage::Staging);
    assert_eq!(report.exit_code(), 4);
    assert!(report.merge.is_none());
    assert_eq!(memory.version(TARGET_PATH).await, Some(1));
    assert_eq!(target_names(&memory).await, vec![(text("1"), text("A"))]);
}

#[tokio::test]
async fn merge_failure_keeps_the_new_staging_table() {
    init_test_tracing();

    let snapshots = snapshot_dir();
    let memory = MemoryTableStore::new();

    let api = ItemsApiMock::start().await;
    api.mount_pages(vec![vec![item("1", "A", "Report")]]).await;
    let config = sync_config(api.endpoint(), snapshots.path());
    let store = FailingTableStore::wrap(memory.clone(), TARGET_PATH);

    let report = Pipeline::new(config, static_provider(), store).run().await;

    let failure = report.failure.as_ref().unwrap();
    assert_eq!(failure.stage, Stage::Merge);
    assert_eq!(failure.error.kind(), ErrorKind::StorageError);
    assert_eq!(report.exit_code(), 5);
    assert_eq!(report.staging_commit.map(|commit| commit.row_count), Some(1));
    assert!(!memory.exists(TARGET_PATH).await.unwrap());
}

#[tokio::test]
async fn client_credentials_token_authorizes_page_requests() {
    init_test_tracing();

    let snapshots = snapshot_dir();
    let store = MemoryTableStore::new();

    let api = ItemsApiMock::start().await;
    api.mock_token("sync-client").await;
    api.mount_pages(vec![vec![item("1", "A", "Report")]]).await;
    let config = sync_config(api.endpoint(), snapshots.path());
    let provider = ConfiguredTokenProvider::from_config(&TokenProviderConfig::ClientCredentials {
        token_url: api.token_url(),
        client_id: "sync-client".to_string(),
        client_secret: SecretString::new("secret".to_string()),
    })
    .unwrap();
    assert_eq!(provider.name(), "client_credentials");

    let report = Pipeline::new(config, provider, store.clone()).run().await;

    assert_eq!(report.status(), RunStatus::Success);
    assert_eq!(report.items_fetched, 1);
}

#[tokio::test]
async fn rejected_credentials_fetch_nothing() {
    init_test_tracing();

    let snapshots = snapshot_dir();
    let store = MemoryTableStore::new();

    let api = ItemsApiMock::start().await;
    api.mock_token_rejected().await;
    api.mount_unreachable(1).await;
    let config = sync_config(api.endpoint(), snapshots.path());
    let provider = ConfiguredTokenProvider::from_config(&TokenProviderConfig::ClientCredentials {
        token_url: api.token_url(),
        client_id: "sync-client".to_string(),
        client_secret: SecretString::new("wrong".to_string()),
    })
    .unwrap();

    let report = Pipeline::new(config, provider, store.clone()).run().await;

    let failure = report.failure.as_ref().unwrap();
    assert_eq!(failure.stage, Stage::Authenticate);
    assert_eq!(failure.error.kind(), ErrorKind::AuthenticationError);
    assert_eq!(report.exit_code(), 2);
    assert!(!store.exists(STAGING_PATH).await.unwrap());
}
