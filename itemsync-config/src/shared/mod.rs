//! Shared configuration types for itemsync runs.

mod auth;
mod base;
mod merge;
mod source;
mod storage;
mod sync;

pub use auth::{AuthConfig, TokenProviderConfig};
pub use base::ValidationError;
pub use merge::{MergeConfig, NormalizeConfig};
pub use source::SourceConfig;
pub use storage::{SnapshotConfig, TablesConfig};
pub use sync::SyncConfig;
