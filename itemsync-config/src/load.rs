use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::environment::Environment;
use crate::shared::SyncConfig;

/// Directory holding the configuration layers, relative to the working directory.
const CONFIGURATION_DIR: &str = "configuration";

/// File stem of the layer every environment starts from.
const BASE_STEM: &str = "base";

/// Extensions tried, in order, for each layer.
const LAYER_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

const ENV_PREFIX: &str = "APP";
const ENV_PREFIX_SEPARATOR: &str = "_";
const ENV_KEY_SEPARATOR: &str = "__";

/// Keys whose environment variable values are comma-separated lists.
const ENV_LIST_KEYS: &[&str] = &["merge.update_columns"];

/// Errors raised while assembling a [`SyncConfig`].
#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("failed to determine the current directory: {0}")]
    CurrentDir(#[source] io::Error),

    #[error("configuration directory `{0}` does not exist")]
    MissingConfigurationDirectory(PathBuf),

    #[error("could not locate the {layer} layer in `{directory}`; attempted: {attempted}")]
    ConfigurationFileMissing {
        layer: String,
        directory: PathBuf,
        attempted: String,
    },

    #[error("failed to load the {layer} layer from `{path}`: {source}")]
    ConfigurationFileLoad {
        layer: String,
        path: PathBuf,
        source: config::ConfigError,
    },

    #[error("failed to deserialize the sync configuration: {0}")]
    Deserialization(#[source] config::ConfigError),

    /// `APP_ENVIRONMENT` holds an unknown environment.
    #[error("failed to determine runtime environment: {0}")]
    Environment(#[from] io::Error),

    #[error("failed to apply environment variable overrides: {0}")]
    Overrides(#[source] config::ConfigError),
}

/// A configuration file found on disk.
#[derive(Debug)]
struct Layer {
    name: String,
    path: PathBuf,
}

impl Layer {
    fn locate(directory: &Path, stem: &str, name: String) -> Result<Self, LoadConfigError> {
        let candidates: Vec<PathBuf> = LAYER_EXTENSIONS
            .iter()
            .map(|extension| directory.join(format!("{stem}.{extension}")))
            .collect();

        if let Some(path) = candidates.iter().find(|path| path.is_file()) {
            return Ok(Self {
                name,
                path: path.clone(),
            });
        }

        let attempted = candidates
            .iter()
            .map(|path| format!("`{}`", path.display()))
            .collect::<Vec<_>>()
            .join(", ");

        Err(LoadConfigError::ConfigurationFileMissing {
            layer: name,
            directory: directory.to_path_buf(),
            attempted,
        })
    }
}

/// Loads the [`SyncConfig`] of the current process.
///
/// Layers `configuration/base.*`, then `configuration/{environment}.*` (yaml, yml or json), then
/// `APP_`-prefixed environment variables. Nested keys use double underscores
/// (`APP_SOURCE__ENDPOINT`) and `APP_MERGE__UPDATE_COLUMNS` is a comma-separated list.
pub fn load_config() -> Result<SyncConfig, LoadConfigError> {
    let working_directory = std::env::current_dir().map_err(LoadConfigError::CurrentDir)?;
    let environment = Environment::load()?;

    load_config_from(&working_directory.join(CONFIGURATION_DIR), environment)
}

/// Same as [`load_config`] with an explicit configuration directory and environment.
pub fn load_config_from(
    configuration_directory: &Path,
    environment: Environment,
) -> Result<SyncConfig, LoadConfigError> {
    load_layers(configuration_directory, environment, None)
}

/// `variables` replaces the process environment when set.
fn load_layers(
    configuration_directory: &Path,
    environment: Environment,
    variables: Option<HashMap<String, String>>,
) -> Result<SyncConfig, LoadConfigError> {
    if !configuration_directory.is_dir() {
        return Err(LoadConfigError::MissingConfigurationDirectory(
            configuration_directory.to_path_buf(),
        ));
    }

    let layers = [
        Layer::locate(
            configuration_directory,
            BASE_STEM,
            "base configuration".to_string(),
        )?,
        Layer::locate(
            configuration_directory,
            environment.as_str(),
            format!("{environment} environment configuration"),
        )?,
    ];

    let mut builder = config::Config::builder();
    for layer in &layers {
        builder = builder.add_source(config::File::from(layer.path.clone()));
        // Built per layer so a parse error names its file.
        builder
            .build_cloned()
            .map_err(|source| LoadConfigError::ConfigurationFileLoad {
                layer: layer.name.clone(),
                path: layer.path.clone(),
                source,
            })?;
    }

    let mut overrides = config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_PREFIX_SEPARATOR)
        .separator(ENV_KEY_SEPARATOR)
        .try_parsing(true)
        .list_separator(",")
        .source(variables);
    for key in ENV_LIST_KEYS {
        overrides = overrides.with_list_parse_key(key);
    }

    builder
        .add_source(overrides)
        .build()
        .map_err(LoadConfigError::Overrides)?
        .try_deserialize::<SyncConfig>()
        .map_err(LoadConfigError::Deserialization)
}
