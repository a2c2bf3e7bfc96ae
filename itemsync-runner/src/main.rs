//! Sync job binary.
//!
//! Runs one incremental sync of the admin items API into the configured tables and exits with a
//! code describing the outcome. All input comes from `configuration/` files and `APP_`
//! environment variables.

use std::process::ExitCode;

use itemsync::auth::ConfiguredTokenProvider;
use itemsync::pipeline::{Pipeline, PipelineReport};
use itemsync::store::parquet::ParquetTableStore;
use itemsync_config::environment::Environment;
use itemsync_config::shared::SyncConfig;
use itemsync_telemetry::tracing::{LogFormat, init_tracing};
use tracing::{info, warn};

use crate::config::load_sync_config;
use crate::error::{RunnerError, RunnerResult};

mod config;
mod error;

/// Overrides the log format picked from the environment.
const LOG_FORMAT_ENV_NAME: &str = "APP_LOG_FORMAT";

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprint!("{}", err.render_report());
            ExitCode::from(err.exit_code())
        }
    }
}

/// Loads configuration, initializes tracing and runs the pipeline on a current-thread runtime.
fn run() -> RunnerResult<u8> {
    let environment = Environment::load().map_err(RunnerError::config)?;
    let sync_config = load_sync_config()?;

    let _log_flusher = init_tracing(env!("CARGO_BIN_NAME"), log_format(environment)?)
        .map_err(RunnerError::config)?;

    info!(%environment, "configuration loaded");

    let report = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(async_main(sync_config))?;

    Ok(report.exit_code())
}

async fn async_main(sync_config: SyncConfig) -> RunnerResult<PipelineReport> {
    let token_provider = ConfiguredTokenProvider::from_config(&sync_config.auth.provider)?;
    let table_store = ParquetTableStore::new();

    let report = Pipeline::new(sync_config, token_provider, table_store)
        .run()
        .await;

    for degradation in &report.degradations {
        warn!(%degradation, "run degraded");
    }

    info!(
        status = %report.status(),
        exit_code = report.exit_code(),
        target_rows = ?report.target_row_count(),
        snapshot = ?report.snapshot_path,
        "sync job finished"
    );

    Ok(report)
}

/// Plain logs in dev and JSON in prod unless `APP_LOG_FORMAT` says otherwise.
fn log_format(environment: Environment) -> RunnerResult<LogFormat> {
    if let Ok(format) = std::env::var(LOG_FORMAT_ENV_NAME) {
        return format.parse().map_err(RunnerError::config);
    }

    let format = match environment {
        Environment::Dev => LogFormat::Plain,
        Environment::Prod => LogFormat::Json,
    };

    Ok(format)
}
