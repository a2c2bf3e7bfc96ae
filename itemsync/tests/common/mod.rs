#![allow(dead_code)]

pub mod api;
pub mod store;

use std::path::Path;
use std::time::Duration;

use itemsync::types::ItemRecord;
use itemsync_config::shared::{
    AuthConfig, MergeConfig, NormalizeConfig, SnapshotConfig, SourceConfig, SyncConfig,
    TablesConfig, TokenProviderConfig,
};
use secrecy::SecretString;
use serde_json::Value;

/// Bearer token accepted by [`api::ItemsApiMock`].
pub const TEST_TOKEN: &str = "test-token";

pub const STAGING_PATH: &str = "staging";
pub const TARGET_PATH: &str = "target";

pub fn test_token() -> SecretString {
    SecretString::new(TEST_TOKEN.to_string())
}

/// Source configuration for `endpoint` without the inter-page delay.
pub fn source_config(endpoint: String) -> SourceConfig {
    let mut config = SourceConfig::new(endpoint);
    config.page_delay = Duration::ZERO;
    config.request_timeout = Duration::from_secs(5);

    config
}

/// Full run configuration against `endpoint`, writing snapshots into `snapshot_dir`.
pub fn sync_config(endpoint: String, snapshot_dir: &Path) -> SyncConfig {
    SyncConfig {
        source: source_config(endpoint),
        auth: AuthConfig {
            scope: AuthConfig::DEFAULT_SCOPE.to_string(),
            provider: TokenProviderConfig::Static {
                token: test_token(),
            },
        },
        snapshot: SnapshotConfig {
            directory: snapshot_dir.to_path_buf(),
            file_prefix: SnapshotConfig::DEFAULT_FILE_PREFIX.to_string(),
        },
        tables: TablesConfig {
            staging_path: STAGING_PATH.to_string(),
            target_path: TARGET_PATH.to_string(),
        },
        merge: MergeConfig::default(),
        normalize: NormalizeConfig::default(),
    }
}

/// Builds an item the way the admin API returns it.
pub fn item(id: &str, name: &str, kind: &str) -> Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "type": kind,
        "workspaceId": "w-1",
        "creatorPrincipal": {"id": "p-1", "type": "User"}
    })
}

pub fn item_ids(items: &[ItemRecord]) -> Vec<&str> {
    items
        .iter()
        .map(|item| item["id"].as_str().unwrap())
        .collect()
}
