//! Table storage used for the staging and target tables.

mod base;
pub mod memory;
pub mod parquet;

pub use base::{CommitInfo, TableStore};
