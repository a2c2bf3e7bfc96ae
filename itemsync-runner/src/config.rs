use itemsync_config::load_config;
use itemsync_config::shared::SyncConfig;

use crate::error::{RunnerError, RunnerResult};

/// Loads and validates the sync configuration.
///
/// Uses the standard configuration loading mechanism from [`itemsync_config`] and validates the
/// resulting [`SyncConfig`] before returning it.
pub fn load_sync_config() -> RunnerResult<SyncConfig> {
    let config = load_config().map_err(RunnerError::config)?;
    config.validate().map_err(RunnerError::config)?;

    Ok(config)
}
