//! Configuration for itemsync runs.
//!
//! Holds the [`shared::SyncConfig`] structure and the layered loader that reads it from
//! `configuration/` files and `APP_`-prefixed environment variables.

pub mod environment;
mod load;
pub mod shared;

pub use load::{LoadConfigError, load_config, load_config_from};
